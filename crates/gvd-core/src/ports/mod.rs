//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `reqwest` or `tokio::process` types in any signature
//! - Implementations live in `gvd-runtime`; tests supply hand-written fakes

pub mod connectivity;
pub mod event_emitter;
pub mod release_source;

pub use connectivity::{ConnectivityProbe, StaticProbe};
pub use event_emitter::{AppEventEmitter, NoopEmitter};
pub use release_source::{ReleaseAsset, ReleaseInfo, ReleaseSource, ReleaseSourceError};
