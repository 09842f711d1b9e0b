//! Version normalization and comparison for managed tools.
//!
//! Normalization rule: everything before the first ASCII digit is dropped,
//! the rest is read as the sequence of maximal digit runs (so `.`, `-`, `_`,
//! `+`, `T` and `:` all act as separators), and trailing zero groups are
//! ignored. `v2024.08.06`, `2024.8.6` and `2024.08.06.0` are equal; an ISO
//! timestamp such as `2024-08-06T12:00:00Z` orders by its date then time.

use std::cmp::Ordering;
use std::fmt;

/// A normalized version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    groups: Vec<u64>,
}

impl Version {
    /// Parse a version string; `None` when it contains no digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let start = raw.find(|c: char| c.is_ascii_digit())?;
        let mut groups: Vec<u64> = raw[start..]
            .split(|c: char| !c.is_ascii_digit())
            .filter(|g| !g.is_empty())
            .map(|g| g.parse::<u64>().unwrap_or(u64::MAX))
            .collect();

        while groups.len() > 1 && groups.last() == Some(&0) {
            groups.pop();
        }
        Some(Self { groups })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.groups.len().max(other.groups.len());
        for i in 0..len {
            let a = self.groups.get(i).copied().unwrap_or(0);
            let b = other.groups.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.groups.iter().map(u64::to_string).collect();
        f.write_str(&joined.join("."))
    }
}

/// Decide whether `latest` should be offered over `installed`.
///
/// An unknown or unparseable `latest` never offers an update. A missing
/// `installed` always does. An unparseable `installed` is compared as a
/// plain string.
pub fn is_update_available(installed: Option<&str>, latest: Option<&str>) -> bool {
    let Some(latest_raw) = latest.map(str::trim).filter(|s| !s.is_empty()) else {
        return false;
    };
    let Some(latest) = Version::parse(latest_raw) else {
        return false;
    };
    let Some(installed_raw) = installed.map(str::trim).filter(|s| !s.is_empty()) else {
        return true;
    };

    Version::parse(installed_raw).map_or_else(
        || installed_raw != latest_raw,
        |installed| latest > installed,
    )
}
