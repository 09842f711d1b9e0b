//! Path utilities for gvd data directories and managed tool locations.
//!
//! This module provides the canonical path resolution for all gvd components:
//! - Application data root
//! - Requirements directory holding the managed `yt-dlp` and `ffmpeg` binaries
//! - Persisted version record, settings and download queue files
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - adapters handle user prompts separately
//! - OS-specific logic is kept private in `platform`

mod error;
mod platform;
mod tools;

// Error type
pub use error::PathError;

// Platform detection and roots
pub use platform::{config_path, data_root, queue_path, requirements_dir, versions_path};

// Managed executables
pub use tools::{executable_name, tool_path};
