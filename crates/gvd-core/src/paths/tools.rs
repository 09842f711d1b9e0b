//! Managed executable naming.

use std::path::{Path, PathBuf};

/// Platform executable file name for a tool (`ffmpeg` → `ffmpeg.exe` on Windows).
pub fn executable_name(tool: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{tool}.exe")
    } else {
        tool.to_string()
    }
}

/// Location of a managed tool inside the requirements directory.
pub fn tool_path(requirements_dir: &Path, tool: &str) -> PathBuf {
    requirements_dir.join(executable_name(tool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executable_name() {
        let name = executable_name("yt-dlp");
        #[cfg(target_os = "windows")]
        assert_eq!(name, "yt-dlp.exe");
        #[cfg(not(target_os = "windows"))]
        assert_eq!(name, "yt-dlp");
    }

    #[test]
    fn test_tool_path_joins_requirements_dir() {
        let path = tool_path(Path::new("/opt/gvd/requirements"), "ffmpeg");
        assert!(path.starts_with("/opt/gvd/requirements"));
        assert!(path.to_string_lossy().contains("ffmpeg"));
    }
}
