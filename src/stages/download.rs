//! Download stage: fetch article pages and extract their text.
//!
//! Candidates come from the recent `serp_clean` window; a link already in
//! the `downloaded_links` cache window is skipped. A download or
//! extraction failure leaves the link uncached, so the next run tries it
//! again rather than permanently recording an empty article.

use crate::extract::extract_article_text;
use crate::models::{CollectedLink, DownloadedArticle};
use crate::pacing::Pacer;
use crate::runner::{RunSummary, StageSpec, UnitOfWork, run_stage};
use crate::stages::{ARTICLE_FILE, ARTICLE_RESULTS_DIR, DOWNLOADED_LINKS_DIR, LINKS_FILE, SERP_CLEAN_DIR};
use crate::store::{RecordStore, today};
use crate::window::{KeySource, load_records};
use std::error::Error;
use tracing::instrument;

struct FetchArticle<'a> {
    http: &'a reqwest::Client,
}

impl UnitOfWork for FetchArticle<'_> {
    type Input = CollectedLink;
    type Output = DownloadedArticle;

    async fn perform(&self, input: &CollectedLink) -> Result<DownloadedArticle, Box<dyn Error>> {
        let text = extract_article_text(self.http, &input.link).await?;
        Ok(DownloadedArticle {
            stub: input.clone(),
            text,
        })
    }
}

/// Run the download stage.
///
/// `input_lookback` bounds how far back in `serp_clean` the work queue
/// reaches; `lookback` bounds the dedup window over `downloaded_links`.
#[instrument(level = "info", skip_all)]
pub async fn run<S: RecordStore>(
    store: &S,
    http: &reqwest::Client,
    pacer: &Pacer,
    lookback: usize,
    input_lookback: usize,
) -> Result<RunSummary, Box<dyn Error>> {
    let input_window = store.list_recent(SERP_CLEAN_DIR, input_lookback).await?;
    let candidates: Vec<CollectedLink> = load_records(store, &input_window).await;

    let spec = StageSpec {
        name: "download",
        output_dir: ARTICLE_RESULTS_DIR,
        output_suffix: ARTICLE_FILE,
        cache_dir: DOWNLOADED_LINKS_DIR,
        cache_suffix: LINKS_FILE,
        cache_source: KeySource::PlainLine,
        lookback,
    };
    let worker = FetchArticle { http };
    run_stage(store, &spec, candidates, &worker, Some(pacer), today()).await
}
