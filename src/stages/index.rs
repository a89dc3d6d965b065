//! Index stage: add summaries to the vector store.
//!
//! Candidates come from the recent `article_results_summarized` window;
//! links in the `indexed_links` cache window are skipped. Each new summary
//! is added as one document (the link doubling as document id) and a
//! receipt is appended to `indexed_records`. The vector store is a local
//! service, not a scrape target, so this stage runs unpaced.

use crate::models::{IndexedRecord, SummarizedArticle};
use crate::runner::{RunSummary, StageSpec, UnitOfWork, run_stage};
use crate::stages::{INDEXED_FILE, INDEXED_LINKS_DIR, INDEXED_RECORDS_DIR, LINKS_FILE, SUMMARIES_DIR};
use crate::store::{RecordStore, today};
use crate::vdb::VectorIndex;
use crate::window::{KeySource, load_records};
use chrono::Utc;
use std::error::Error;
use tracing::instrument;

struct AddToCollection<'a, V> {
    index: &'a V,
}

impl<V: VectorIndex> UnitOfWork for AddToCollection<'_, V> {
    type Input = SummarizedArticle;
    type Output = IndexedRecord;

    async fn perform(&self, input: &SummarizedArticle) -> Result<IndexedRecord, Box<dyn Error>> {
        self.index.add_summary(input).await?;
        Ok(IndexedRecord {
            link: input.article.stub.link.clone(),
            collection: self.index.collection_name().to_string(),
            time_indexed: Utc::now().timestamp(),
        })
    }
}

/// Run the index stage against an already-resolved collection.
#[instrument(level = "info", skip_all)]
pub async fn run<S: RecordStore, V: VectorIndex>(
    store: &S,
    index: &V,
    lookback: usize,
    input_lookback: usize,
) -> Result<RunSummary, Box<dyn Error>> {
    let input_window = store.list_recent(SUMMARIES_DIR, input_lookback).await?;
    let candidates: Vec<SummarizedArticle> = load_records(store, &input_window).await;

    let spec = StageSpec {
        name: "index",
        output_dir: INDEXED_RECORDS_DIR,
        output_suffix: INDEXED_FILE,
        cache_dir: INDEXED_LINKS_DIR,
        cache_suffix: LINKS_FILE,
        cache_source: KeySource::PlainLine,
        lookback,
    };
    let worker = AddToCollection { index };
    run_stage(store, &spec, candidates, &worker, None, today()).await
}
