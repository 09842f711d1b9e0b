//! Remote file download and archive extraction.
//!
//! # Structure
//!
//! - `DownloadJob` - streams one URL to disk with percent progress and cancellation
//! - `archive` - unpacks zip / tar.gz / tar.xz releases into a flat tool directory (in-process)

mod archive;
mod job;

pub use archive::{ArchiveKind, ExtractError, extract_tools, install_raw_binary};
pub use job::{DownloadError, DownloadJob};
