//! Vector store collaborator (Chroma-style REST API).
//!
//! The index stage needs exactly one capability: add a summary document
//! with its metadata to a named collection. That seam is the
//! [`VectorIndex`] trait; [`ChromaCollection`] implements it against the
//! Chroma v1 HTTP API. The article link doubles as the document id, which
//! makes re-adding the same article harmless on the server side as well.
//!
//! Text splitting of summaries is intentionally not done here; summaries
//! are short enough to index whole.

use crate::models::SummarizedArticle;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::error::Error;
use std::fmt;
use tracing::{info, instrument};

/// Narrow indexing seam consumed by the index stage.
pub trait VectorIndex {
    /// The collection name documents are added under.
    fn collection_name(&self) -> &str;

    async fn add_summary(&self, record: &SummarizedArticle) -> Result<(), Box<dyn Error>>;
}

/// Metadata columns stored alongside each document, for retrieval-time
/// attribution and filtering.
pub fn document_metadata(record: &SummarizedArticle) -> Value {
    let stub = &record.article.stub;
    json!({
        "link": stub.link,
        "domain": stub.domain,
        "publisher": stub.publisher,
        "serp_date": stub.serp_date,
        "title": stub.title,
    })
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Debug, Serialize)]
struct AddRequest<'a> {
    ids: Vec<&'a str>,
    metadatas: Vec<Value>,
    documents: Vec<&'a str>,
}

/// HTTP client for a Chroma server.
pub struct ChromaClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChromaClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get or create a collection and return a handle bound to its id.
    ///
    /// Called once per run, before any per-item work; failure here is an
    /// infrastructure problem and aborts the index stage.
    #[instrument(level = "info", skip_all, fields(collection = %name))]
    pub async fn ensure_collection(&self, name: &str) -> Result<ChromaCollection, Box<dyn Error>> {
        let info = self
            .http
            .post(format!("{}/api/v1/collections", self.base_url))
            .json(&CreateCollectionRequest {
                name,
                get_or_create: true,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<CollectionInfo>()
            .await?;

        info!(collection_id = %info.id, "Collection ready");
        Ok(ChromaCollection {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            name: name.to_string(),
            id: info.id,
        })
    }
}

impl fmt::Debug for ChromaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromaClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// A resolved collection that documents can be added to.
pub struct ChromaCollection {
    http: reqwest::Client,
    base_url: String,
    name: String,
    id: String,
}

impl VectorIndex for ChromaCollection {
    fn collection_name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "info", skip_all, fields(link = %record.article.stub.link))]
    async fn add_summary(&self, record: &SummarizedArticle) -> Result<(), Box<dyn Error>> {
        let Some(summary) = record.summary.article_summary.as_deref() else {
            return Err(format!(
                "record for {} has no summary text to index",
                record.article.stub.link
            )
            .into());
        };

        let request = AddRequest {
            ids: vec![record.article.stub.link.as_str()],
            metadatas: vec![document_metadata(record)],
            documents: vec![summary],
        };
        self.http
            .post(format!(
                "{}/api/v1/collections/{}/add",
                self.base_url, self.id
            ))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CollectedLink, DownloadedArticle, SummaryOutcome};

    fn record() -> SummarizedArticle {
        SummarizedArticle {
            article: DownloadedArticle {
                stub: CollectedLink {
                    link: "https://example.com/story".to_string(),
                    title: Some("A Story".to_string()),
                    publisher: Some("Example News".to_string()),
                    authors: None,
                    serp_date: Some("03/01/2024".to_string()),
                    domain: "example.com".to_string(),
                    pub_token: "T1".to_string(),
                },
                text: "Body.".to_string(),
            },
            summary: SummaryOutcome {
                article_summary: Some("Summary.".to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_document_metadata_columns() {
        let metadata = document_metadata(&record());
        assert_eq!(metadata["link"], "https://example.com/story");
        assert_eq!(metadata["domain"], "example.com");
        assert_eq!(metadata["publisher"], "Example News");
        assert_eq!(metadata["title"], "A Story");
        assert_eq!(metadata["serp_date"], "03/01/2024");
        // Exactly the retrieval metadata columns, nothing bulky.
        assert_eq!(metadata.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_metadata_tolerates_missing_optionals() {
        let mut rec = record();
        rec.article.stub.publisher = None;
        let metadata = document_metadata(&rec);
        assert!(metadata["publisher"].is_null());
    }

    #[test]
    fn test_add_request_shape() {
        let rec = record();
        let request = AddRequest {
            ids: vec![rec.article.stub.link.as_str()],
            metadatas: vec![document_metadata(&rec)],
            documents: vec!["Summary."],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["ids"][0], "https://example.com/story");
        assert_eq!(value["documents"][0], "Summary.");
        assert_eq!(value["metadatas"][0]["domain"], "example.com");
    }
}
