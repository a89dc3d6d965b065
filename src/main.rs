//! # Reliable News DB
//!
//! An incremental pipeline that discovers news article URLs through the
//! SERP API, downloads and extracts article text, summarizes each article
//! with a language model, and indexes the summaries into a vector store
//! for semantic retrieval.
//!
//! ## How work is deduplicated
//!
//! Every stage appends its output to dated, append-only files and decides
//! what is new by scanning a rolling window of its own recent files. Keys
//! (article URLs) older than the window are treated as unseen and may be
//! reprocessed; that staleness/cost trade-off is tuned with `--lookback`.
//! Runs are idempotent within the window: re-running a stage with no new
//! upstream data processes nothing.
//!
//! ## Usage
//!
//! ```sh
//! reliable_news_db --lookback 14 collect --domains-file domains.csv
//! reliable_news_db --lookback 4 download
//! reliable_news_db --lookback 14 summarize
//! reliable_news_db --lookback 14 index --collection news_summaries
//! ```

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod domains;
mod extract;
mod models;
mod pacing;
mod runner;
mod serp;
mod stages;
mod store;
mod utils;
mod vdb;
mod window;

use api::{OpenAiSummarizer, RetrySummarize};
use cli::{Cli, CollectOpts, Command, IndexOpts, SummarizeOpts};
use pacing::Pacer;
use runner::RunSummary;
use serp::SerpClient;
use store::FsRecordStore;
use vdb::ChromaClient;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("reliable_news_db starting up");

    let args = Cli::parse();
    debug!(?args.data_dir, args.lookback, "Parsed CLI arguments");

    // Configuration-class problems end the run here, before any stage
    // touches the data directory.
    let pacer = Pacer::new(Duration::from_secs(1), args.wait_min, args.wait_max)?;
    let store = FsRecordStore::new(&args.data_dir);
    let lookback = args.lookback as usize;
    let input_lookback = args.input_lookback();

    match &args.command {
        Command::Collect(opts) => {
            run_collect(&store, opts, &pacer, lookback).await?;
        }
        Command::Download => {
            run_download(&store, &pacer, lookback, input_lookback).await?;
        }
        Command::Summarize(opts) => {
            run_summarize(&store, opts, &pacer, lookback, input_lookback).await?;
        }
        Command::Index(opts) => {
            run_index(&store, opts, lookback, input_lookback).await?;
        }
        Command::Run {
            collect,
            summarize,
            index,
        } => {
            run_collect(&store, collect, &pacer, lookback).await?;
            run_download(&store, &pacer, lookback, input_lookback).await?;
            run_summarize(&store, summarize, &pacer, lookback, input_lookback).await?;
            run_index(&store, index, lookback, input_lookback).await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

async fn run_collect(
    store: &FsRecordStore,
    opts: &CollectOpts,
    pacer: &Pacer,
    lookback: usize,
) -> Result<RunSummary, Box<dyn Error>> {
    let rows = domains::load_domains(Path::new(&opts.domains_file)).await?;
    let serp = SerpClient::new(opts.serp_api_key.clone());
    stages::collect::run(store, &serp, &rows, pacer, lookback).await
}

async fn run_download(
    store: &FsRecordStore,
    pacer: &Pacer,
    lookback: usize,
    input_lookback: usize,
) -> Result<RunSummary, Box<dyn Error>> {
    let http = reqwest::Client::new();
    stages::download::run(store, &http, pacer, lookback, input_lookback).await
}

async fn run_summarize(
    store: &FsRecordStore,
    opts: &SummarizeOpts,
    pacer: &Pacer,
    lookback: usize,
    input_lookback: usize,
) -> Result<RunSummary, Box<dyn Error>> {
    let summarizer = RetrySummarize::new(
        OpenAiSummarizer::new(
            opts.openai_api_key.clone(),
            opts.openai_base_url.clone(),
            opts.model.clone(),
        ),
        5,
        Duration::from_secs(1),
    );
    stages::summarize::run(store, &summarizer, pacer, lookback, input_lookback).await
}

async fn run_index(
    store: &FsRecordStore,
    opts: &IndexOpts,
    lookback: usize,
    input_lookback: usize,
) -> Result<RunSummary, Box<dyn Error>> {
    let client = ChromaClient::new(opts.chroma_url.clone());
    let collection = client.ensure_collection(&opts.collection).await?;
    stages::index::run(store, &collection, lookback, input_lookback).await
}
