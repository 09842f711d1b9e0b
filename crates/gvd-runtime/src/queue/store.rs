//! `queue.json` persistence.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gvd_core::QueueItem;
use serde_json::Value;
use tracing::warn;

/// Reads and writes the queue file.
///
/// Callers serialize access; [`JobQueue`](super::JobQueue) only saves while
/// holding its state lock.
#[derive(Debug, Clone)]
pub struct QueueStore {
    path: PathBuf,
}

impl QueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in saved order.
    ///
    /// A missing or malformed file yields an empty queue and entries that no
    /// longer parse are skipped. Entries that were running when the file was
    /// written come back as `Stopped`.
    pub fn load(&self) -> Vec<QueueItem> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read queue");
                return Vec::new();
            }
        };

        let entries: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Queue file is malformed");
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<QueueItem>(entry) {
                Ok(mut item) => {
                    item.status = item.status.restored();
                    Some(item)
                }
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable queue entry");
                    None
                }
            })
            .collect()
    }

    /// Replace the file with `items`, via a temporary file and rename.
    pub fn save(&self, items: &[QueueItem]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(items).map_err(io::Error::other)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gvd_core::{JobOptions, QueueStatus};
    use tempfile::TempDir;

    fn item(url: &str, status: QueueStatus) -> QueueItem {
        let mut item = QueueItem::new("", JobOptions::new(url, "/tmp/out"));
        item.status = status;
        item
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = QueueStore::new(dir.path().join("queue.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_saved_order_and_fields_survive() {
        let dir = TempDir::new().unwrap();
        let store = QueueStore::new(dir.path().join("nested").join("queue.json"));
        let mut first = item("https://example.com/a", QueueStatus::Finished);
        first.progress = 100.0;
        let second = item("https://example.com/b", QueueStatus::Queued);
        store.save(&[first.clone(), second.clone()]).unwrap();

        let loaded = QueueStore::new(store.path()).load();
        assert_eq!(loaded, vec![first, second]);
    }

    #[test]
    fn test_running_entries_restore_as_stopped() {
        let dir = TempDir::new().unwrap();
        let store = QueueStore::new(dir.path().join("queue.json"));
        store
            .save(&[
                item("https://example.com/a", QueueStatus::Downloading),
                item("https://example.com/b", QueueStatus::Waiting),
                item("https://example.com/c", QueueStatus::Failed),
            ])
            .unwrap();

        let statuses: Vec<_> = store.load().iter().map(|i| i.status).collect();
        assert_eq!(
            statuses,
            vec![QueueStatus::Stopped, QueueStatus::Stopped, QueueStatus::Failed]
        );
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        let store = QueueStore::new(dir.path().join("queue.json"));
        let good = item("https://example.com/a", QueueStatus::Queued);

        let mut inverted = serde_json::to_value(item("https://example.com/b", QueueStatus::Queued)).unwrap();
        inverted["options"]["section"] = serde_json::json!({ "start": "2:00", "end": "1:00" });
        let entries = serde_json::json!([serde_json::to_value(&good).unwrap(), { "id": 7 }, inverted]);
        fs::write(store.path(), entries.to_string()).unwrap();

        assert_eq!(store.load(), vec![good]);
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = QueueStore::new(dir.path().join("queue.json"));
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_empty());
    }
}
