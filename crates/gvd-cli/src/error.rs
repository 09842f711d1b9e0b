//! CLI error type and exit codes.

use gvd_core::{PathError, SettingsError, ValidationError};
use gvd_runtime::{DependencyError, JobError, QueueError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Bad user input.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Network unreachable or a remote request failed.
    #[error("{0}")]
    Network(String),

    /// A managed tool is missing or could not be installed.
    #[error("{0}")]
    Dependency(String),

    /// The fetch tool failed.
    #[error("{0}")]
    Job(String),

    /// The user interrupted the operation.
    #[error("{0}")]
    Cancelled(String),
}

impl CliError {
    /// Exit code following sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Job(_) => 1,
            Self::Arguments(_) => 2,   // EX_USAGE
            Self::Network(_) => 69,    // EX_UNAVAILABLE
            Self::Dependency(_) => 72, // EX_OSFILE
            Self::Io(_) => 74,         // EX_IOERR
            Self::Config(_) => 78,     // EX_CONFIG
            Self::Cancelled(_) => 130,
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        Self::Arguments(err.to_string())
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Io { .. } => Self::Io(err.to_string()),
            _ => Self::Config(err.to_string()),
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<JobError> for CliError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Validation(e) => e.into(),
            JobError::Connectivity => Self::Network(err.to_string()),
            JobError::Launch(e) => Self::Dependency(format!("{e}. Run `gvd deps install` first.")),
            JobError::Execution { .. } | JobError::UnknownJob(_) => Self::Job(err.to_string()),
        }
    }
}

impl From<QueueError> for CliError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::UnknownItem(_) => Self::Arguments(err.to_string()),
            QueueError::Validation(e) => e.into(),
            QueueError::Job(e) => e.into(),
            QueueError::Persist(_) => Self::Io(err.to_string()),
        }
    }
}

impl From<DependencyError> for CliError {
    fn from(err: DependencyError) -> Self {
        match err {
            DependencyError::UnknownDependency(_) => Self::Arguments(err.to_string()),
            DependencyError::ReleaseFetch(_) | DependencyError::Download(_) => {
                Self::Network(err.to_string())
            }
            DependencyError::Cancelled(_) => Self::Cancelled(err.to_string()),
            DependencyError::Io(_) | DependencyError::Persist(_) => Self::Io(err.to_string()),
            _ => Self::Dependency(err.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
