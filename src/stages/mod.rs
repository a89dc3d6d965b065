//! Pipeline stages and their file layout.
//!
//! Each stage module wires the generic stage runner to its directories,
//! its dedup key source, and its unit of work:
//!
//! | Stage | Input | Output | Key cache |
//! |-------|-------|--------|-----------|
//! | [`collect`] | domain table + SERP API | `serp_raw`, `serp_clean` | `serp_clean` itself |
//! | [`download`] | `serp_clean` window | `article_results` | `downloaded_links` |
//! | [`summarize`] | `article_results` window | `article_results_summarized` | `summarized_links` |
//! | [`index`] | `article_results_summarized` window | vector store + `indexed_records` | `indexed_links` |
//!
//! All directories live under the configured data root; files within them
//! are dated and append-only.

pub mod collect;
pub mod download;
pub mod index;
pub mod summarize;

pub const SERP_RAW_DIR: &str = "serp_raw";
pub const SERP_CLEAN_DIR: &str = "serp_clean";
pub const DOWNLOADED_LINKS_DIR: &str = "downloaded_links";
pub const ARTICLE_RESULTS_DIR: &str = "article_results";
pub const SUMMARIZED_LINKS_DIR: &str = "summarized_links";
pub const SUMMARIES_DIR: &str = "article_results_summarized";
pub const INDEXED_LINKS_DIR: &str = "indexed_links";
pub const INDEXED_RECORDS_DIR: &str = "indexed_records";

pub const SERP_RAW_FILE: &str = "serp_raw_results.jsonl";
pub const SERP_CLEAN_FILE: &str = "serp_clean_records.jsonl";
pub const LINKS_FILE: &str = "links.txt";
pub const ARTICLE_FILE: &str = "article_results.jsonl";
pub const SUMMARY_FILE: &str = "article_results_summarized.jsonl";
pub const INDEXED_FILE: &str = "indexed_records.jsonl";
