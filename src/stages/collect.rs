//! Collect stage: discover new article URLs via the SERP API.
//!
//! For every row of the domain table the raw SERP payload is archived to
//! `serp_raw`, then its `news_results` are distilled into article stubs.
//! The stubs from all domains flow through the stage runner, which drops
//! any link already present in the recent `serp_clean` window and appends
//! the rest. The clean records file is its own key cache; no separate
//! links file exists for this stage.
//!
//! Pacing happens here around the per-domain fetches (the network-bound
//! step), not in the runner: distilling an already-fetched payload is
//! purely local work.

use crate::models::{CollectedLink, DomainRow};
use crate::pacing::Pacer;
use crate::runner::{RunSummary, StageSpec, UnitOfWork, run_stage};
use crate::serp::{SerpClient, clean_records};
use crate::stages::{SERP_CLEAN_DIR, SERP_CLEAN_FILE, SERP_RAW_DIR, SERP_RAW_FILE};
use crate::store::{RecordStore, dated_file_name, today};
use crate::window::KeySource;
use itertools::Itertools;
use std::error::Error;
use tracing::{info, instrument, warn};

/// Collect is pure bookkeeping once the stubs exist; the unit of work
/// records the stub as-is.
struct RecordStub;

impl UnitOfWork for RecordStub {
    type Input = CollectedLink;
    type Output = CollectedLink;

    async fn perform(&self, input: &CollectedLink) -> Result<CollectedLink, Box<dyn Error>> {
        Ok(input.clone())
    }
}

/// Drop repeated links within one batch, keeping first occurrence order.
/// Outlets syndicate stories, so the same URL can show up under several
/// domains in a single collection pass.
fn dedupe_batch(stubs: Vec<CollectedLink>) -> Vec<CollectedLink> {
    stubs
        .into_iter()
        .unique_by(|stub| stub.link.clone())
        .collect()
}

/// Fetch every domain's payload, archive it, and distill candidate stubs.
///
/// A failed fetch for one domain is logged and skipped; the remaining
/// domains are still queried.
async fn fetch_candidates<S: RecordStore>(
    store: &S,
    serp: &SerpClient,
    domains: &[DomainRow],
    pacer: &Pacer,
) -> Result<Vec<CollectedLink>, Box<dyn Error>> {
    let raw_file = dated_file_name(today(), SERP_RAW_FILE);
    let mut stubs = Vec::new();

    for (idx, row) in domains.iter().enumerate() {
        info!(
            domain = %row.domain,
            position = idx + 1,
            total = domains.len(),
            "Querying SERP API"
        );
        if idx != 0 {
            pacer.wait().await;
        }

        let raw = match serp.fetch(&row.gnews_pub_token).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(domain = %row.domain, error = %e, "SERP fetch failed; skipping domain");
                continue;
            }
        };
        store
            .append_line(SERP_RAW_DIR, &raw_file, &raw.to_string())
            .await?;
        stubs.extend(clean_records(&raw, &row.domain, &row.gnews_pub_token));
    }

    Ok(dedupe_batch(stubs))
}

/// Run the collect stage over the whole domain table.
#[instrument(level = "info", skip_all, fields(domains = domains.len()))]
pub async fn run<S: RecordStore>(
    store: &S,
    serp: &SerpClient,
    domains: &[DomainRow],
    pacer: &Pacer,
    lookback: usize,
) -> Result<RunSummary, Box<dyn Error>> {
    let candidates = fetch_candidates(store, serp, domains, pacer).await?;

    let spec = StageSpec {
        name: "collect",
        output_dir: SERP_CLEAN_DIR,
        output_suffix: SERP_CLEAN_FILE,
        cache_dir: SERP_CLEAN_DIR,
        cache_suffix: SERP_CLEAN_FILE,
        cache_source: KeySource::JsonField("link"),
        lookback,
    };
    run_stage(store, &spec, candidates, &RecordStub, None, today()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(link: &str, domain: &str) -> CollectedLink {
        CollectedLink {
            link: link.to_string(),
            title: None,
            publisher: None,
            authors: None,
            serp_date: None,
            domain: domain.to_string(),
            pub_token: "T".to_string(),
        }
    }

    #[test]
    fn test_dedupe_batch_keeps_first_occurrence() {
        let batch = vec![
            stub("https://a", "first.com"),
            stub("https://b", "first.com"),
            stub("https://a", "second.com"),
        ];
        let deduped = dedupe_batch(batch);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].domain, "first.com");
        assert_eq!(deduped[1].link, "https://b");
    }

    #[test]
    fn test_dedupe_batch_empty() {
        assert!(dedupe_batch(Vec::new()).is_empty());
    }
}
