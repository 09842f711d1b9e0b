//! Queue error taxonomy.

use gvd_core::{QueueItemId, ValidationError};
use thiserror::Error;

use crate::job::JobError;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("No queue item with id {0}")]
    UnknownItem(QueueItemId),

    /// The entry's options are not runnable; nothing was added.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The entry could not be started.
    #[error(transparent)]
    Job(#[from] JobError),

    #[error("Failed to save queue: {0}")]
    Persist(#[source] std::io::Error),
}
