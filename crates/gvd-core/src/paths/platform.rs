//! Platform-specific root directory resolution.

use std::env;
use std::fs;
use std::path::PathBuf;

use super::error::PathError;

/// Environment variable overriding the application data root.
const DATA_DIR_ENV: &str = "GVD_DATA_DIR";

/// Environment variable overriding the requirements directory.
const REQUIREMENTS_DIR_ENV: &str = "GVD_REQUIREMENTS_DIR";

/// Get the root directory for application data (settings, version record).
///
/// Resolution order:
/// 1. `GVD_DATA_DIR` environment variable (highest priority)
/// 2. System data directory (e.g., `~/.local/share/gvd`)
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(DATA_DIR_ENV) {
        if path.trim().is_empty() {
            return Err(PathError::EmptyPath);
        }
        return Ok(PathBuf::from(path));
    }

    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    let root = data_dir.join("gvd");

    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| PathError::CreateFailed {
            path: root.clone(),
            reason: e.to_string(),
        })?;
    }

    Ok(root)
}

/// Get the directory holding the managed tool binaries.
///
/// `GVD_REQUIREMENTS_DIR` wins; otherwise `<data_root>/requirements`.
pub fn requirements_dir() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(REQUIREMENTS_DIR_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    Ok(data_root()?.join("requirements"))
}

/// Path of the persisted dependency version record.
pub fn versions_path() -> Result<PathBuf, PathError> {
    Ok(requirements_dir()?.join("versions.json"))
}

/// Path of the persisted settings file.
pub fn config_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join("config.json"))
}

/// Path of the persisted download queue.
pub fn queue_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join("queue.json"))
}
