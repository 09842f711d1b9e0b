//! Persisted version record.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use gvd_core::VersionRecordFile;

/// Serialized access to `versions.json`.
///
/// Every update is a read-modify-write under one lock, written to a
/// temporary file and renamed into place, so concurrent writers never
/// interleave and a crash never leaves a half-written record.
#[derive(Debug)]
pub struct VersionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl VersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record; a missing or malformed file yields an empty record.
    pub fn load(&self) -> VersionRecordFile {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_unlocked()
    }

    /// Apply `f` to the current record and persist the result.
    pub fn update(&self, f: impl FnOnce(&mut VersionRecordFile)) -> io::Result<VersionRecordFile> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut record = self.read_unlocked();
        f(&mut record);
        self.write_unlocked(&record)?;
        Ok(record)
    }

    fn read_unlocked(&self) -> VersionRecordFile {
        match fs::read_to_string(&self.path) {
            Ok(raw) => VersionRecordFile::from_json(&raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => VersionRecordFile::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Cannot read version record");
                VersionRecordFile::default()
            }
        }
    }

    fn write_unlocked(&self, record: &VersionRecordFile) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = record.to_json().map_err(io::Error::other)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gvd_core::DependencyKind;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = VersionStore::new(dir.path().join("versions.json"));
        assert!(store.load().dependencies.is_empty());
    }

    #[test]
    fn test_update_persists() {
        let dir = TempDir::new().unwrap();
        let store = VersionStore::new(dir.path().join("nested").join("versions.json"));
        store
            .update(|r| r.mark_installed(DependencyKind::YtDlp, "2024.08.06"))
            .unwrap();

        let reopened = VersionStore::new(store.path());
        let entry = reopened.load();
        let entry = entry.get(DependencyKind::YtDlp).unwrap();
        assert_eq!(entry.installed_version.as_deref(), Some("2024.08.06"));
    }

    #[test]
    fn test_concurrent_updates_keep_valid_json() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(VersionStore::new(dir.path().join("versions.json")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let kind = if i % 2 == 0 { DependencyKind::Ffmpeg } else { DependencyKind::YtDlp };
                    store.update(|r| r.mark_installed(kind, &format!("1.{i}"))).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let raw = fs::read_to_string(store.path()).unwrap();
        let parsed: VersionRecordFile = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.dependencies.len(), 2);
    }
}
