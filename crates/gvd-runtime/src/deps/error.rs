//! Dependency acquisition errors.

use std::io;

use gvd_core::ReleaseSourceError;
use thiserror::Error;

use crate::download::{DownloadError, ExtractError};

#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("Unknown dependency: {0}")]
    UnknownDependency(String),

    #[error("An install or update of {0} is already in progress")]
    Busy(String),

    #[error("{0} is not installed")]
    NotInstalled(String),

    #[error("No prebuilt {name} available: {reason}")]
    PrebuiltNotAvailable { name: String, reason: String },

    #[error("Failed to query latest release: {0}")]
    ReleaseFetch(#[from] ReleaseSourceError),

    #[error("No asset matching {selector} in release {tag}")]
    AssetNotFound { selector: String, tag: String },

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("{0} install cancelled")]
    Cancelled(String),

    #[error("Failed to save version record: {0}")]
    Persist(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DependencyError {
    /// Short status shown next to the tool in a front end.
    pub const fn status_label(&self) -> &'static str {
        match self {
            Self::UnknownDependency(_) => "Unknown dependency",
            Self::Busy(_) => "Busy",
            Self::NotInstalled(_) => "Not installed",
            Self::PrebuiltNotAvailable { .. } => "Not available",
            Self::ReleaseFetch(_) => "Network Error",
            Self::AssetNotFound { .. } => "Asset not found",
            Self::Download(DownloadError::Cancelled) | Self::Cancelled(_) => "cancelled",
            Self::Download(_) => "Download Error",
            Self::Extraction(_) => "Extraction Failed",
            Self::Persist(_) | Self::Io(_) => "Install Error",
        }
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_) | Self::Download(DownloadError::Cancelled))
    }
}
