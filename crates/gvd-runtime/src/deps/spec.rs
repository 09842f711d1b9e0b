//! Release asset selection per tool and platform.

use gvd_core::{DependencyKind, executable_name};

/// How to pick the right file from a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSelector {
    /// Asset name must match exactly.
    Exact(String),
    /// Asset name must end with this suffix.
    Suffix(String),
}

impl AssetSelector {
    pub fn matches(&self, asset_name: &str) -> bool {
        match self {
            Self::Exact(name) => asset_name == name,
            Self::Suffix(suffix) => asset_name.ends_with(suffix.as_str()),
        }
    }
}

impl std::fmt::Display for AssetSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(name) => f.write_str(name),
            Self::Suffix(suffix) => write!(f, "*{suffix}"),
        }
    }
}

/// Whether a prebuilt release exists for the current platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrebuiltAvailability {
    Available {
        selector: AssetSelector,
        description: String,
    },
    NotAvailable {
        reason: String,
    },
}

/// Everything the manager needs to know about one tool.
#[derive(Debug, Clone)]
pub struct DependencySpec {
    pub kind: DependencyKind,
    /// Platform file names that must all exist once installed.
    pub executables: Vec<String>,
    pub availability: PrebuiltAvailability,
}

impl DependencySpec {
    /// Spec for the current platform.
    pub fn for_current_platform(kind: DependencyKind) -> Self {
        Self {
            kind,
            executables: kind.executables().iter().map(|t| executable_name(t)).collect(),
            availability: platform_availability(kind),
        }
    }

    /// Spec with an explicit asset selector, for custom release sources.
    pub fn with_selector(kind: DependencyKind, selector: AssetSelector) -> Self {
        Self {
            kind,
            executables: kind.executables().iter().map(|t| executable_name(t)).collect(),
            availability: PrebuiltAvailability::Available {
                description: selector.to_string(),
                selector,
            },
        }
    }

    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Specs for both managed tools on this platform.
pub fn default_specs() -> Vec<DependencySpec> {
    DependencyKind::ALL
        .into_iter()
        .map(DependencySpec::for_current_platform)
        .collect()
}

#[allow(dead_code)]
fn available(selector: AssetSelector, description: &str) -> PrebuiltAvailability {
    PrebuiltAvailability::Available {
        selector,
        description: description.to_string(),
    }
}

#[allow(dead_code)]
fn not_available(reason: &str) -> PrebuiltAvailability {
    PrebuiltAvailability::NotAvailable {
        reason: reason.to_string(),
    }
}

fn platform_availability(kind: DependencyKind) -> PrebuiltAvailability {
    match kind {
        DependencyKind::YtDlp => yt_dlp_availability(),
        DependencyKind::Ffmpeg => ffmpeg_availability(),
    }
}

fn yt_dlp_availability() -> PrebuiltAvailability {
    #[cfg(target_os = "windows")]
    {
        available(AssetSelector::Exact("yt-dlp.exe".into()), "Windows executable")
    }

    #[cfg(target_os = "macos")]
    {
        available(AssetSelector::Exact("yt-dlp_macos".into()), "macOS universal binary")
    }

    #[cfg(target_os = "linux")]
    {
        #[cfg(target_arch = "x86_64")]
        {
            available(AssetSelector::Exact("yt-dlp_linux".into()), "Linux x64 binary")
        }
        #[cfg(target_arch = "aarch64")]
        {
            available(AssetSelector::Exact("yt-dlp_linux_aarch64".into()), "Linux ARM64 binary")
        }
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            not_available("Unsupported Linux architecture")
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        not_available("Unsupported operating system")
    }
}

fn ffmpeg_availability() -> PrebuiltAvailability {
    #[cfg(target_os = "windows")]
    {
        #[cfg(target_arch = "x86_64")]
        {
            available(AssetSelector::Suffix("-win64-gpl.zip".into()), "Windows x64 (GPL build)")
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            not_available("Unsupported Windows architecture")
        }
    }

    #[cfg(target_os = "linux")]
    {
        #[cfg(target_arch = "x86_64")]
        {
            available(AssetSelector::Suffix("-linux64-gpl.tar.xz".into()), "Linux x64 (GPL build)")
        }
        #[cfg(target_arch = "aarch64")]
        {
            available(
                AssetSelector::Suffix("-linuxarm64-gpl.tar.xz".into()),
                "Linux ARM64 (GPL build)",
            )
        }
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            not_available("Unsupported Linux architecture")
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    {
        not_available("No prebuilt ffmpeg release for this platform; install it with your package manager")
    }
}
