//! Summarize stage: run downloaded article text through the language model.
//!
//! Candidates come from the recent `article_results` window; links in the
//! `summarized_links` cache window are skipped. Article text is trimmed to
//! a character budget before the call so an overlong article cannot
//! overflow the model's context. The summarizer passed in is expected to
//! carry its own retry policy (see [`crate::api::RetrySummarize`]).

use crate::api::Summarize;
use crate::models::{DownloadedArticle, SummarizedArticle};
use crate::pacing::Pacer;
use crate::runner::{RunSummary, StageSpec, UnitOfWork, run_stage};
use crate::stages::{ARTICLE_RESULTS_DIR, LINKS_FILE, SUMMARIES_DIR, SUMMARIZED_LINKS_DIR, SUMMARY_FILE};
use crate::store::{RecordStore, today};
use crate::utils::{trim_for_prompt, truncate_for_log};
use crate::window::{KeySource, load_records};
use std::error::Error;
use tracing::{debug, instrument};

/// Roughly 3500 tokens at ~4 characters per token, leaving headroom in a
/// gpt-3.5-class context window for the prompt and the completion.
const PROMPT_CHAR_BUDGET: usize = 14_000;

struct SummarizeArticle<'a, T> {
    summarizer: &'a T,
}

impl<T: Summarize> UnitOfWork for SummarizeArticle<'_, T> {
    type Input = DownloadedArticle;
    type Output = SummarizedArticle;

    async fn perform(&self, input: &DownloadedArticle) -> Result<SummarizedArticle, Box<dyn Error>> {
        let trimmed = trim_for_prompt(&input.text, PROMPT_CHAR_BUDGET);
        let summary = self.summarizer.summarize(trimmed).await?;
        debug!(
            preview = %truncate_for_log(summary.article_summary.as_deref().unwrap_or(""), 120),
            "Summary received"
        );
        Ok(SummarizedArticle {
            article: input.clone(),
            summary,
        })
    }
}

/// Run the summarize stage.
#[instrument(level = "info", skip_all)]
pub async fn run<S: RecordStore, T: Summarize>(
    store: &S,
    summarizer: &T,
    pacer: &Pacer,
    lookback: usize,
    input_lookback: usize,
) -> Result<RunSummary, Box<dyn Error>> {
    let input_window = store.list_recent(ARTICLE_RESULTS_DIR, input_lookback).await?;
    let candidates: Vec<DownloadedArticle> = load_records(store, &input_window).await;

    let spec = StageSpec {
        name: "summarize",
        output_dir: SUMMARIES_DIR,
        output_suffix: SUMMARY_FILE,
        cache_dir: SUMMARIZED_LINKS_DIR,
        cache_suffix: LINKS_FILE,
        cache_source: KeySource::PlainLine,
        lookback,
    };
    let worker = SummarizeArticle { summarizer };
    run_stage(store, &spec, candidates, &worker, Some(pacer), today()).await
}
