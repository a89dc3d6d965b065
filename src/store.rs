//! Append-only, dated record storage.
//!
//! The pipeline's "database" is the file system: each stage appends
//! newline-delimited records to one file per calendar day, named
//! `YYYY_MM_DD__<suffix>`. Files are never rewritten or deleted; old days
//! simply age out of the lookback window.
//!
//! The [`RecordStore`] trait keeps the backing swappable (local disk here,
//! but object storage or an embedded KV would satisfy the same contract).
//! Writes are line-granular appends, so concurrent same-day runs accumulate
//! rather than clobber. A crash mid-append can leave a partial trailing
//! line; readers are expected to skip lines that fail to parse.

use chrono::{Local, NaiveDate};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Build the file name for one day of stage output, e.g.
/// `2024_03_01__article_results.jsonl`.
///
/// The ISO-ordered date prefix makes a plain descending filename sort a
/// sort by recency, which is what [`RecordStore::list_recent`] relies on.
pub fn dated_file_name(date: NaiveDate, suffix: &str) -> String {
    format!("{}__{}", date.format("%Y_%m_%d"), suffix)
}

/// Today's date in the local timezone, used for naming output files.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Abstract storage for dated, append-only record files.
///
/// Directories are stage-specific names relative to the store's root
/// (e.g. `serp_clean`, `downloaded_links`).
pub trait RecordStore {
    /// Append one newline-terminated entry to `dir/file_name`, creating
    /// the directory and file if absent. Never truncates.
    async fn append_line(&self, dir: &str, file_name: &str, line: &str) -> io::Result<()>;

    /// Return up to `k` file paths from `dir`, most recent first
    /// (descending filename order; the date prefix makes that a date
    /// sort). A missing or empty directory yields an empty vec.
    ///
    /// # Errors
    ///
    /// `k == 0` is a caller contract violation and returns an
    /// `InvalidInput` error rather than silently selecting nothing.
    async fn list_recent(&self, dir: &str, k: usize) -> io::Result<Vec<PathBuf>>;

    /// Read every line of `path`. Lines are returned raw; it is the
    /// caller's job to skip entries that fail to parse (e.g. a partial
    /// trailing line from an interrupted append).
    async fn read_lines(&self, path: &Path) -> io::Result<Vec<String>>;
}

/// [`RecordStore`] backed by a local data directory.
#[derive(Debug, Clone)]
pub struct FsRecordStore {
    root: PathBuf,
}

impl FsRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Full path of a stage file without touching the file system.
    pub fn path_for(&self, dir: &str, file_name: &str) -> PathBuf {
        self.root.join(dir).join(file_name)
    }
}

impl RecordStore for FsRecordStore {
    async fn append_line(&self, dir: &str, file_name: &str, line: &str) -> io::Result<()> {
        let dir_path = self.root.join(dir);
        fs::create_dir_all(&dir_path).await?;

        let path = dir_path.join(file_name);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        debug!(path = %path.display(), bytes = line.len(), "Appended record line");
        Ok(())
    }

    async fn list_recent(&self, dir: &str, k: usize) -> io::Result<Vec<PathBuf>> {
        if k == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "lookback window must be at least 1 file",
            ));
        }

        let dir_path = self.root.join(dir);
        let mut entries = match fs::read_dir(&dir_path).await {
            Ok(entries) => entries,
            // A stage that has never run has no directory yet. Treat it
            // the same as an empty window.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names: Vec<String> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort_unstable_by(|a, b| b.cmp(a));
        names.truncate(k);

        debug!(dir = %dir_path.display(), k, selected = names.len(), "Resolved lookback window");
        Ok(names.into_iter().map(|n| dir_path.join(n)).collect())
    }

    async fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let contents = fs::read_to_string(path).await?;
        Ok(contents.lines().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_dated_file_name_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            dated_file_name(date, "links.txt"),
            "2024_03_01__links.txt"
        );
    }

    #[tokio::test]
    async fn test_append_creates_and_accumulates() {
        let tmp = tempdir().unwrap();
        let store = FsRecordStore::new(tmp.path());

        store.append_line("serp_clean", "2024_03_01__x.jsonl", "one").await.unwrap();
        store.append_line("serp_clean", "2024_03_01__x.jsonl", "two").await.unwrap();

        let path = store.path_for("serp_clean", "2024_03_01__x.jsonl");
        let lines = store.read_lines(&path).await.unwrap();
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_append_does_not_clobber_existing_contents() {
        let tmp = tempdir().unwrap();
        let store = FsRecordStore::new(tmp.path());

        store.append_line("d", "2024_03_01__x.txt", "first run").await.unwrap();
        // A second "run" against the same day's file must accumulate.
        let store2 = FsRecordStore::new(tmp.path());
        store2.append_line("d", "2024_03_01__x.txt", "second run").await.unwrap();

        let lines = store.read_lines(&store.path_for("d", "2024_03_01__x.txt")).await.unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[tokio::test]
    async fn test_list_recent_returns_most_recent_first() {
        let tmp = tempdir().unwrap();
        let store = FsRecordStore::new(tmp.path());
        for name in [
            "2024_02_27__x.jsonl",
            "2024_03_01__x.jsonl",
            "2024_02_29__x.jsonl",
        ] {
            store.append_line("d", name, "{}").await.unwrap();
        }

        let window = store.list_recent("d", 2).await.unwrap();
        let names: Vec<_> = window
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["2024_03_01__x.jsonl", "2024_02_29__x.jsonl"]);
    }

    #[tokio::test]
    async fn test_list_recent_bounded_by_file_count() {
        let tmp = tempdir().unwrap();
        let store = FsRecordStore::new(tmp.path());
        store.append_line("d", "2024_03_01__x.jsonl", "{}").await.unwrap();

        let window = store.list_recent("d", 14).await.unwrap();
        assert_eq!(window.len(), 1);
    }

    #[tokio::test]
    async fn test_list_recent_missing_dir_is_empty_window() {
        let tmp = tempdir().unwrap();
        let store = FsRecordStore::new(tmp.path());
        let window = store.list_recent("never_ran", 4).await.unwrap();
        assert!(window.is_empty());
    }

    #[tokio::test]
    async fn test_list_recent_rejects_zero_lookback() {
        let tmp = tempdir().unwrap();
        let store = FsRecordStore::new(tmp.path());
        let err = store.list_recent("d", 0).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_same_day_ties_share_the_window() {
        let tmp = tempdir().unwrap();
        let store = FsRecordStore::new(tmp.path());
        store.append_line("d", "2024_03_01__a.jsonl", "{}").await.unwrap();
        store.append_line("d", "2024_03_01__b.jsonl", "{}").await.unwrap();

        let window = store.list_recent("d", 2).await.unwrap();
        assert_eq!(window.len(), 2);
    }
}
