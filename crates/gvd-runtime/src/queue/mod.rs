//! Persisted download queue.
//!
//! # Structure
//!
//! - `JobQueue` - ordering, priority starts and sequential runs on top of
//!   the job controller
//! - `QueueStore` - `queue.json` persistence
//! - `QueueError` - queue failure taxonomy

mod error;
mod manager;
mod store;

pub use error::QueueError;
pub use manager::JobQueue;
pub use store::QueueStore;
