//! Runtime adapters for gvd.
//!
//! Everything that touches processes, the network or the filesystem lives
//! here: spawning the fetch tool and streaming its output, acquiring the
//! managed tools from upstream releases, and the concrete implementations of
//! the `gvd-core` ports.
#![deny(unsafe_code)]

pub mod command;
pub mod connectivity;
pub mod deps;
pub mod download;
pub mod emitter;
pub mod job;
pub mod process;
pub mod progress;
pub mod queue;

// Re-export the job controller and its error
pub use job::{
    FAILURE_MESSAGE, JobError, JobLogEntry, JobLogManager, JobWatch, ToolPaths, VideoJobController,
};

// Re-export the download queue
pub use queue::{JobQueue, QueueError, QueueStore};

// Re-export dependency management
pub use deps::{
    DEFAULT_GITHUB_API, DependencyError, DependencyManager, DependencyManagerConfig,
    GitHubReleaseSource, VersionStore, default_specs,
};

// Re-export port implementations
pub use connectivity::HttpConnectivityProbe;
pub use emitter::ChannelEmitter;

// Re-export process primitives
pub use process::{LaunchSpec, ProcessHandle, ProcessRunner, RunnerError};
