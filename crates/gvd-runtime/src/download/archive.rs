//! Release archive extraction.
//!
//! Only the required executables are taken from an archive; directory
//! structure is flattened so every tool lands directly in the install
//! directory. Each file is written to a temporary name and renamed into
//! place, then marked executable on Unix.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use thiserror::Error;
use tracing::debug;
use xz2::read::XzDecoder;

/// Errors from unpacking a downloaded release.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read archive {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("I/O error during extraction: {0}")]
    Io(#[from] io::Error),

    #[error("Archive is missing required binaries: {}", missing.join(", "))]
    MissingBinaries { missing: Vec<String> },
}

/// Packaging of a release asset, decided from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
    TarXz,
    /// A bare executable.
    Raw,
}

impl ArchiveKind {
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Self::Zip
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Self::TarGz
        } else if lower.ends_with(".tar.xz") || lower.ends_with(".txz") {
            Self::TarXz
        } else {
            Self::Raw
        }
    }
}

/// Unpack `required` executables (platform file names) from `archive` into `dest_dir`.
///
/// Returns the installed paths in `required` order.
pub async fn extract_tools(
    archive: &Path,
    kind: ArchiveKind,
    dest_dir: &Path,
    required: &[String],
) -> Result<Vec<PathBuf>, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    match kind {
        ArchiveKind::Zip | ArchiveKind::TarGz | ArchiveKind::TarXz => {
            let archive = archive.to_path_buf();
            let dest = dest_dir.to_path_buf();
            let names = required.to_vec();
            tokio::task::spawn_blocking(move || -> Result<(), ExtractError> {
                match kind {
                    ArchiveKind::Zip => extract_zip(&archive, &dest, &names),
                    ArchiveKind::TarXz => {
                        let file = File::open(&archive)?;
                        extract_tar(XzDecoder::new(file), &archive, &dest, &names)
                    }
                    _ => {
                        let file = File::open(&archive)?;
                        extract_tar(GzDecoder::new(file), &archive, &dest, &names)
                    }
                }
            })
            .await
            .map_err(|e| ExtractError::Io(io::Error::other(e)))??;
        }
        ArchiveKind::Raw => {
            let name = required.first().ok_or_else(|| ExtractError::MissingBinaries {
                missing: vec!["<executable>".to_string()],
            })?;
            install_raw_binary(archive, dest_dir, name)?;
        }
    }

    let installed: Vec<PathBuf> = required.iter().map(|n| dest_dir.join(n)).collect();
    let missing: Vec<String> = required
        .iter()
        .zip(&installed)
        .filter(|(_, path)| !path.is_file())
        .map(|(name, _)| name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(ExtractError::MissingBinaries { missing });
    }
    Ok(installed)
}

/// Move a downloaded single-file tool into place as `dest_dir/name`.
pub fn install_raw_binary(src: &Path, dest_dir: &Path, name: &str) -> Result<PathBuf, ExtractError> {
    fs::create_dir_all(dest_dir)?;
    let dest = dest_dir.join(name);
    let mut input = File::open(src)?;
    write_executable(&mut input, &dest)?;
    let _ = fs::remove_file(src);
    Ok(dest)
}

fn extract_zip(archive: &Path, dest_dir: &Path, required: &[String]) -> Result<(), ExtractError> {
    let corrupt = |e: &dyn std::fmt::Display| ExtractError::Corrupt {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    };

    let file = File::open(archive)?;
    let mut zip_archive = zip::ZipArchive::new(file).map_err(|e| corrupt(&e))?;
    let mut wanted: HashSet<&str> = required.iter().map(String::as_str).collect();

    for i in 0..zip_archive.len() {
        let mut entry = zip_archive.by_index(i).map_err(|e| corrupt(&e))?;
        if entry.is_dir() {
            continue;
        }
        let entry_name = entry.name().to_string();
        let Some(file_name) = entry_name.rsplit('/').next().filter(|n| !n.is_empty()) else {
            continue;
        };
        if wanted.remove(file_name) {
            write_executable(&mut entry, &dest_dir.join(file_name))?;
            debug!(entry = %entry_name, "Extracted binary");
        }
    }
    Ok(())
}

/// Shared entry loop for compressed tarballs; `decoded` yields the raw tar stream.
fn extract_tar(
    decoded: impl Read,
    archive: &Path,
    dest_dir: &Path,
    required: &[String],
) -> Result<(), ExtractError> {
    let corrupt = |e: io::Error| ExtractError::Corrupt {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    };

    let mut tar = tar::Archive::new(decoded);
    let mut wanted: HashSet<&str> = required.iter().map(String::as_str).collect();

    for entry in tar.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path().map_err(corrupt)?.into_owned();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        if wanted.remove(file_name.as_str()) {
            write_executable(&mut entry, &dest_dir.join(&file_name))?;
            debug!(entry = %path.display(), "Extracted binary");
        }
        if wanted.is_empty() {
            break;
        }
    }
    Ok(())
}

fn write_executable(input: &mut impl Read, dest: &Path) -> io::Result<()> {
    let mut tmp_name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = dest.with_file_name(tmp_name);

    {
        let mut out = File::create(&tmp)?;
        io::copy(input, &mut out)?;
        out.sync_all()?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o755))?;
    }

    fs::rename(&tmp, dest)
}
