//! Generic stage driver.
//!
//! Every pipeline stage follows the same shape: build a dedup index from
//! the stage's own recent output, walk the candidate records from the
//! upstream stage, skip what has been seen, do the stage's unit of work
//! for the rest, and append both the enriched record and its bare key to
//! today's files. This module implements that loop once; the stage
//! modules supply a [`UnitOfWork`] and a [`StageSpec`].
//!
//! Items are processed strictly one at a time. One bad article or API
//! hiccup must never abort the batch: a failed unit of work is logged,
//! counted, and left unrecorded so the next run retries it.

use crate::models::Keyed;
use crate::pacing::Pacer;
use crate::store::{RecordStore, dated_file_name};
use crate::window::{KeySource, build_key_set};
use chrono::NaiveDate;
use serde::Serialize;
use std::error::Error;
use tracing::{info, instrument, warn};

/// The stage-specific work performed for one new candidate record.
pub trait UnitOfWork {
    /// Candidate record type, loaded from the upstream stage's window.
    type Input: Keyed;
    /// Enriched record appended to this stage's output file.
    type Output: Serialize;

    async fn perform(&self, input: &Self::Input) -> Result<Self::Output, Box<dyn Error>>;
}

/// Where a stage reads its dedup keys and writes its output.
///
/// For most stages the key cache is a separate `links.txt` directory; for
/// the collect stage the output file itself is the cache (`cache_dir` ==
/// `output_dir`), in which case no separate cache entry is appended.
#[derive(Debug, Clone)]
pub struct StageSpec<'a> {
    pub name: &'static str,
    pub output_dir: &'a str,
    pub output_suffix: &'a str,
    pub cache_dir: &'a str,
    pub cache_suffix: &'a str,
    pub cache_source: KeySource,
    /// How many recent cache files count as "already processed".
    pub lookback: usize,
}

impl StageSpec<'_> {
    fn has_separate_cache(&self) -> bool {
        self.cache_dir != self.output_dir || self.cache_suffix != self.output_suffix
    }
}

/// Counts reported at the end of a stage invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Candidates whose unit of work succeeded and was recorded.
    pub processed: usize,
    /// Candidates already present in the dedup window.
    pub skipped: usize,
    /// Candidates whose unit of work failed; eligible for retry next run.
    pub failed: usize,
}

/// Drive one stage invocation over `candidates`, in input order.
///
/// Pacing, when a pacer is given, applies before every attempted unit of
/// work except the first of the run; skipped candidates never consume a
/// delay. Keys are added to the in-memory set as soon as an item
/// succeeds, so a duplicate later in the same batch is skipped too.
///
/// # Errors
///
/// Only infrastructure problems abort the run: an invalid lookback or a
/// failure to append to today's output files. Per-item work failures are
/// counted in the summary instead.
#[instrument(level = "info", skip_all, fields(stage = spec.name))]
pub async fn run_stage<S, W>(
    store: &S,
    spec: &StageSpec<'_>,
    candidates: Vec<W::Input>,
    worker: &W,
    pacer: Option<&Pacer>,
    today: NaiveDate,
) -> Result<RunSummary, Box<dyn Error>>
where
    S: RecordStore,
    W: UnitOfWork,
{
    let window = store.list_recent(spec.cache_dir, spec.lookback).await?;
    let mut seen = build_key_set(store, &window, spec.cache_source).await;
    info!(
        window_files = window.len(),
        cached_keys = seen.len(),
        candidates = candidates.len(),
        "Stage starting"
    );

    let output_file = dated_file_name(today, spec.output_suffix);
    let cache_file = dated_file_name(today, spec.cache_suffix);

    let mut summary = RunSummary::default();
    let mut attempted_any = false;

    for candidate in &candidates {
        let key = candidate.key().to_string();
        if seen.contains(&key) {
            summary.skipped += 1;
            continue;
        }

        if let Some(pacer) = pacer {
            if attempted_any {
                pacer.wait().await;
            }
        }
        attempted_any = true;

        match worker.perform(candidate).await {
            Ok(output) => {
                let line = serde_json::to_string(&output)?;
                store.append_line(spec.output_dir, &output_file, &line).await?;
                if spec.has_separate_cache() {
                    store.append_line(spec.cache_dir, &cache_file, &key).await?;
                }
                seen.insert(key);
                summary.processed += 1;
            }
            Err(e) => {
                // Not recorded and not cached, so a later run retries it.
                warn!(link = %key, error = %e, "Unit of work failed; continuing");
                summary.failed += 1;
            }
        }
    }

    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed,
        "Stage complete"
    );
    Ok(summary)
}
