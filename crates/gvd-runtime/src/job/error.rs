//! Job error taxonomy.

use gvd_core::{JobId, ValidationError};
use thiserror::Error;

use crate::process::RunnerError;

#[derive(Debug, Error)]
pub enum JobError {
    /// Bad input; nothing was started.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No internet connection. Please check your network and try again.")]
    Connectivity,

    /// The tool could not be started.
    #[error(transparent)]
    Launch(RunnerError),

    /// The tool ran and failed, or was lost after it started.
    #[error("{message}")]
    Execution { code: Option<i32>, message: String },

    #[error("No active job with id {0}")]
    UnknownJob(JobId),
}

impl From<RunnerError> for JobError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::Launch { .. } => Self::Launch(err),
            RunnerError::Wait(reason) => Self::Execution {
                code: None,
                message: format!("Lost track of the running tool: {reason}"),
            },
        }
    }
}
