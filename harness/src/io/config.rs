//! Harness configuration stored at `<root>/harness.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Harness configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to the reference values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Wall-clock budget per unit in seconds, unless a unit overrides it.
    pub default_timeout_secs: u64,

    /// Seconds to sleep after logging a version mismatch so the diagnostic
    /// is not scrolled past unnoticed. Zero disables the delay.
    pub mismatch_delay_secs: u64,

    /// Truncate captured unit/checker output beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Static documentation source scanned for the declared version.
    pub doc_version_source: String,

    pub support: SupportConfig,
    pub envcheck: EnvCheckConfig,
}

/// Location of the shared support library loaded per unit run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SupportConfig {
    /// Directory holding `support.toml`, relative to the suite root.
    pub dir: String,
    /// Namespace token identifying the library's registry entries.
    pub namespace: String,
}

/// External environment checker invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EnvCheckConfig {
    /// Checker command; receives the two config paths as arguments.
    pub command: Vec<String>,
    /// Base defaults handed to the checker first.
    pub base_config: String,
    /// Custom overrides layered on top of the defaults.
    pub custom_config: String,
    pub timeout_secs: u64,
    /// When true, a failed check aborts the suite instead of being logged.
    pub fatal: bool,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            dir: "support".to_string(),
            namespace: "support".to_string(),
        }
    }
}

impl Default for EnvCheckConfig {
    fn default() -> Self {
        Self {
            command: vec!["scripts/envcheck.sh".to_string()],
            base_config: "config/defaults.ini".to_string(),
            custom_config: "config/custom.ini".to_string(),
            timeout_secs: 60,
            fatal: false,
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 600,
            mismatch_delay_secs: 10,
            output_limit_bytes: 100_000,
            doc_version_source: "docs/conf.py".to_string(),
            support: SupportConfig::default(),
            envcheck: EnvCheckConfig::default(),
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_timeout_secs == 0 {
            return Err(anyhow!("default_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.envcheck.timeout_secs == 0 {
            return Err(anyhow!("envcheck.timeout_secs must be > 0"));
        }
        if self.envcheck.command.is_empty() || self.envcheck.command[0].trim().is_empty() {
            return Err(anyhow!("envcheck.command must be a non-empty array"));
        }
        if self.support.namespace.trim().is_empty() {
            return Err(anyhow!("support.namespace must be non-empty"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `HarnessConfig::default()`.
pub fn load_config(path: &Path) -> Result<HarnessConfig> {
    if !path.exists() {
        let cfg = HarnessConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: HarnessConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, HarnessConfig::default());
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("harness.toml");
        fs::write(&path, "default_timeout_secs = 60\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.default_timeout_secs, 60);
        assert_eq!(cfg.envcheck, EnvCheckConfig::default());
    }

    #[test]
    fn validate_rejects_empty_checker_command() {
        let mut cfg = HarnessConfig::default();
        cfg.envcheck.command.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let cfg = HarnessConfig {
            default_timeout_secs: 0,
            ..HarnessConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
