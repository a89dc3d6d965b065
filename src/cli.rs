//! Command-line interface.
//!
//! One subcommand per pipeline stage plus `run` for the whole chain.
//! Credentials and service endpoints come from flags or environment
//! variables; the dedup lookback window is deliberately required, since
//! different deployments tune it differently and a silent default hides
//! real staleness/cost trade-offs.

use clap::{Args, Parser, Subcommand};

/// Incremental news collection, summarization, and vector-indexing
/// pipeline with file-backed deduplication.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Root directory for the pipeline's dated data files
    #[arg(short, long, default_value = "data")]
    pub data_dir: String,

    /// How many recent dated files of a stage's own history count as
    /// "already processed" (required; there is no safe default)
    #[arg(short = 'k', long, env = "PIPELINE_LOOKBACK",
          value_parser = clap::value_parser!(u32).range(1..))]
    pub lookback: u32,

    /// How many recent upstream files form the work queue
    /// (defaults to --lookback)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub input_lookback: Option<u32>,

    /// Minimum pacing jitter between external calls, in seconds
    #[arg(long, default_value_t = 1.0)]
    pub wait_min: f64,

    /// Maximum pacing jitter between external calls, in seconds
    #[arg(long, default_value_t = 5.0)]
    pub wait_max: f64,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn input_lookback(&self) -> usize {
        self.input_lookback.unwrap_or(self.lookback) as usize
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover new article URLs via the SERP API
    Collect(CollectOpts),
    /// Download and extract text for collected links
    Download,
    /// Summarize downloaded articles with the language model
    Summarize(SummarizeOpts),
    /// Add new summaries to the vector store
    Index(IndexOpts),
    /// Run collect, download, summarize, and index in order
    Run {
        #[command(flatten)]
        collect: CollectOpts,
        #[command(flatten)]
        summarize: SummarizeOpts,
        #[command(flatten)]
        index: IndexOpts,
    },
}

#[derive(Args, Debug)]
pub struct CollectOpts {
    /// Domain table CSV with `domain` and `gnews_pub_token` columns
    #[arg(long, default_value = "data/domains/easy_domains.csv")]
    pub domains_file: String,

    /// SERP API key
    #[arg(long, env = "SERP_API_KEY", hide_env_values = true)]
    pub serp_api_key: String,
}

#[derive(Args, Debug)]
pub struct SummarizeOpts {
    /// API key for the summarization endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// Chat completions model used for summaries
    #[arg(long, default_value = "gpt-3.5-turbo")]
    pub model: String,
}

#[derive(Args, Debug)]
pub struct IndexOpts {
    /// Base URL of the Chroma server
    #[arg(long, env = "CHROMA_URL", default_value = "http://localhost:8000")]
    pub chroma_url: String,

    /// Collection the summaries are indexed into
    #[arg(long, default_value = "news_summaries")]
    pub collection: String,
}
