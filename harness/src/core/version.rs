//! Version tokens for the documentation/implementation consistency gate.
//!
//! The documentation side is read by scanning static text for a fixed
//! assignment marker, never by evaluating the source. This keeps the harness
//! free of any dependency on the documentation build tooling.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Semantic version token (`major.minor.patch`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Compare two versions for the consistency gate.
    ///
    /// Only major/minor participate; a patch-level difference between the
    /// documentation and the loaded support library is tolerated.
    pub fn compare(&self, other: &Self) -> Ordering {
        (self.major, self.minor).cmp(&(other.major, other.minor))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().split('.');
        let mut next = |name: &str| -> Result<u32> {
            parts
                .next()
                .ok_or_else(|| anyhow!("version '{s}' missing {name} component"))?
                .parse::<u32>()
                .map_err(|_| anyhow!("version '{s}' has non-numeric {name} component"))
        };
        let major = next("major")?;
        let minor = next("minor")?;
        let patch = next("patch")?;
        if parts.next().is_some() {
            return Err(anyhow!("version '{s}' has more than three components"));
        }
        Ok(Self::new(major, minor, patch))
    }
}

/// Scan static text for the declared documentation version.
///
/// Looks for the first line beginning with the `version = '…'` assignment
/// marker. Returns `None` when no such line exists; the gate treats that as
/// "no version declared" rather than an error.
pub fn scan_declared_version(text: &str) -> Option<Version> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r"^version\s*=\s*'([^']+)'").expect("static regex"));
    for line in text.lines() {
        if let Some(captures) = pattern.captures(line.trim_start()) {
            return captures[1].parse().ok();
        }
    }
    None
}
