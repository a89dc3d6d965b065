//! Record types for each pipeline stage.
//!
//! Every stage reads and writes newline-delimited JSON, one record per line.
//! Rather than passing untyped maps between stages, each stage has an
//! explicit record struct that carries the fields of the previous stage
//! (via `#[serde(flatten)]`) plus whatever that stage adds:
//!
//! - [`CollectedLink`]: an article stub parsed from a SERP response
//! - [`DownloadedArticle`]: stub + extracted article text
//! - [`SummarizedArticle`]: article + summary and API usage details
//! - [`IndexedRecord`]: receipt for a document added to the vector store
//!
//! The article URL (`link`) is the identity key at every stage, exposed
//! through the [`Keyed`] trait so the stage runner can deduplicate without
//! knowing the concrete record type.

use serde::{Deserialize, Serialize};

/// A record with a stable identity key (the article URL).
///
/// The stage runner uses this to decide whether a candidate has already
/// been processed within the lookback window.
pub trait Keyed {
    /// The deduplication key. Must be stable across stages and runs.
    fn key(&self) -> &str;
}

/// One row of the external domain table.
///
/// The table is a read-only CSV with `domain` and `gnews_pub_token`
/// columns; the token identifies the publication to the Google News
/// engine of the SERP API.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DomainRow {
    /// The news domain, e.g. `apnews.com`.
    pub domain: String,
    /// The SERP API Google News publication token for this domain.
    pub gnews_pub_token: String,
}

/// An article stub extracted from one entry of a SERP `news_results` list.
///
/// Produced by the collect stage. Fields other than `link`, `domain`, and
/// `pub_token` are optional because the SERP payload does not guarantee
/// them for every article.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectedLink {
    /// The article URL. Identity key for the whole pipeline.
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Publisher display name, e.g. "The New York Times".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Comma-joined author names, when the payload includes any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    /// The article date as reported by the SERP API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serp_date: Option<String>,
    /// The domain this stub was collected for.
    pub domain: String,
    /// The publication token that produced this stub.
    pub pub_token: String,
}

impl Keyed for CollectedLink {
    fn key(&self) -> &str {
        &self.link
    }
}

/// A collected stub plus the extracted article body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadedArticle {
    #[serde(flatten)]
    pub stub: CollectedLink,
    /// Plain text extracted from the article page.
    pub text: String,
}

impl Keyed for DownloadedArticle {
    fn key(&self) -> &str {
        &self.stub.link
    }
}

/// Summary text and API call details for one summarization request.
///
/// Token counts default to zero when the API response omits usage
/// metadata, so historical records always deserialize.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SummaryOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_summary: Option<String>,
    /// Why the model stopped; "stop" is the expected value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub total_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Unix timestamp of when the completion was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// A downloaded article plus its summary.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummarizedArticle {
    #[serde(flatten)]
    pub article: DownloadedArticle,
    #[serde(flatten)]
    pub summary: SummaryOutcome,
}

impl Keyed for SummarizedArticle {
    fn key(&self) -> &str {
        &self.article.stub.link
    }
}

/// Receipt written after a summary is added to the vector store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexedRecord {
    pub link: String,
    /// Name of the collection the document was added to.
    pub collection: String,
    /// Unix timestamp of the add.
    pub time_indexed: i64,
}

impl Keyed for IndexedRecord {
    fn key(&self) -> &str {
        &self.link
    }
}
