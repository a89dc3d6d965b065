//! Dedup index construction over a lookback window.
//!
//! Each stage decides "already processed?" by scanning the most recent
//! dated files of its own output (or key cache) and collecting the
//! identity keys found there into a set. Historical files are allowed to
//! be imperfect — a partially written trailing line, a record missing its
//! key — so everything here skips bad lines and keeps going. One corrupted
//! file must never abort a run; the valid remainder of the window is still
//! used.

use crate::store::RecordStore;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// How to pull the identity key out of one line of a window file.
#[derive(Debug, Clone, Copy)]
pub enum KeySource {
    /// The file is JSONL; the key is a string field of each record.
    JsonField(&'static str),
    /// The file is plain text with one key (URL) per line.
    PlainLine,
}

/// Build the set of identity keys present in a window of files.
///
/// Unreadable files and unparseable or key-less lines are skipped and
/// counted; a single aggregate warning is emitted when anything was
/// dropped. An empty window yields an empty set.
pub async fn build_key_set<S: RecordStore>(
    store: &S,
    files: &[PathBuf],
    source: KeySource,
) -> HashSet<String> {
    let mut keys = HashSet::new();
    let mut skipped_lines = 0usize;
    let mut skipped_files = 0usize;

    for path in files {
        let lines = match store.read_lines(path).await {
            Ok(lines) => lines,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable window file");
                skipped_files += 1;
                continue;
            }
        };

        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match source {
                KeySource::PlainLine => {
                    keys.insert(line.to_string());
                }
                KeySource::JsonField(field) => {
                    match serde_json::from_str::<serde_json::Value>(line) {
                        Ok(value) => match value.get(field).and_then(|v| v.as_str()) {
                            Some(key) => {
                                keys.insert(key.to_string());
                            }
                            None => skipped_lines += 1,
                        },
                        Err(_) => skipped_lines += 1,
                    }
                }
            }
        }
    }

    if skipped_lines > 0 || skipped_files > 0 {
        warn!(
            skipped_lines,
            skipped_files,
            "Ignored malformed entries while building the dedup index"
        );
    }
    debug!(files = files.len(), keys = keys.len(), "Built dedup key set");
    keys
}

/// Load typed records from a window of JSONL files, in window order.
///
/// Used to turn the upstream stage's recent output into this stage's work
/// queue. Follows the same tolerance policy as [`build_key_set`]: bad
/// lines are dropped with an aggregate warning, never an error.
pub async fn load_records<S, T>(store: &S, files: &[PathBuf]) -> Vec<T>
where
    S: RecordStore,
    T: DeserializeOwned,
{
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for path in files {
        let lines = match store.read_lines(path).await {
            Ok(lines) => lines,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable input file");
                continue;
            }
        };
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(line) {
                Ok(record) => records.push(record),
                Err(_) => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "Ignored malformed lines while loading input records");
    }
    debug!(files = files.len(), records = records.len(), "Loaded candidate records");
    records
}
