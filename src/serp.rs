//! SERP API client for the Google News engine.
//!
//! One publication token identifies one news outlet; fetching it returns a
//! payload whose `news_results` list holds the outlet's recent articles.
//! The raw payload is archived verbatim by the collect stage, so this
//! module hands it back as untyped JSON and separately knows how to distill
//! the per-article fields into [`CollectedLink`] stubs.

use crate::models::CollectedLink;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use tracing::{debug, instrument, warn};

const SERP_SEARCH_URL: &str = "https://serpapi.com/search.json";

/// Thin HTTP client for SerpAPI's Google News engine.
pub struct SerpClient {
    http: reqwest::Client,
    api_key: String,
}

impl SerpClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
        }
    }

    /// Fetch the raw news payload for one publication token.
    #[instrument(level = "info", skip_all, fields(pub_token = %pub_token))]
    pub async fn fetch(&self, pub_token: &str) -> Result<Value, Box<dyn Error>> {
        let response = self
            .http
            .get(SERP_SEARCH_URL)
            .query(&[
                ("engine", "google_news"),
                ("gl", "us"),
                ("api_key", self.api_key.as_str()),
                ("publication_token", pub_token),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(response)
    }
}

impl fmt::Debug for SerpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerpClient").finish_non_exhaustive()
    }
}

/// Distill a raw SERP payload into article stubs for one domain.
///
/// Entries without a `link` are dropped; every other field is optional.
/// A payload with no `news_results` (an empty outlet, or an API-side
/// error body) yields an empty vec with a warning.
pub fn clean_records(raw: &Value, domain: &str, pub_token: &str) -> Vec<CollectedLink> {
    let Some(results) = raw.get("news_results").and_then(Value::as_array) else {
        warn!(domain, "No news_results in SERP payload");
        return Vec::new();
    };

    let mut records = Vec::new();
    for entry in results {
        let Some(link) = entry.get("link").and_then(Value::as_str) else {
            debug!(domain, "Dropping news_results entry without a link");
            continue;
        };
        records.push(CollectedLink {
            link: link.to_string(),
            title: string_at(entry, &["title"]),
            publisher: string_at(entry, &["source", "name"]),
            authors: joined_authors(entry),
            serp_date: string_at(entry, &["date"]),
            domain: domain.to_string(),
            pub_token: pub_token.to_string(),
        });
    }
    debug!(domain, count = records.len(), "Distilled SERP payload");
    records
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str().map(str::to_string)
}

fn joined_authors(entry: &Value) -> Option<String> {
    let authors = entry
        .get("source")
        .and_then(|s| s.get("authors"))
        .and_then(Value::as_array)?;
    let names: Vec<&str> = authors.iter().filter_map(Value::as_str).collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join(","))
    }
}
