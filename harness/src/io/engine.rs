//! Execution engine contract and the process-backed implementation.
//!
//! The [`Engine`] trait is the narrow boundary the scheduler hands units
//! across: identifier, tag, timeout in; pass/fail/timeout report out. Tests
//! use scripted engines that return predetermined reports without spawning
//! processes.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::core::unit::{Unit, UnitOutcome, UnitReport};
use crate::io::process::run_command_with_timeout;

/// Environment variable naming the support-library directory for the unit.
///
/// The support handle is injected explicitly rather than looked up through
/// any ambient global state.
pub const SUPPORT_DIR_ENV: &str = "HARNESS_SUPPORT_DIR";

/// Abstraction over unit execution backends.
pub trait Engine {
    /// Run one unit to completion or timeout. Failures of the unit itself
    /// are reported in the [`UnitReport`]; `Err` means the engine could not
    /// run it at all (missing manifest, spawn failure).
    fn run_unit(&self, root: &Path, unit: &Unit) -> Result<UnitReport>;
}

/// Per-unit manifest (`<unit dir>/<basename>.toml`).
#[derive(Debug, Deserialize)]
struct UnitManifest {
    /// Command to execute, argv style.
    command: Vec<String>,
    /// Optional override of the inherited global timeout.
    timeout_secs: Option<u64>,
}

/// Engine that runs each unit's manifest command as a child process.
pub struct ProcessEngine {
    output_limit_bytes: usize,
    support_dir: PathBuf,
}

impl ProcessEngine {
    pub fn new(output_limit_bytes: usize, support_dir: PathBuf) -> Self {
        Self {
            output_limit_bytes,
            support_dir,
        }
    }

    fn load_manifest(unit_dir: &Path) -> Result<UnitManifest> {
        let basename = unit_dir
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("unit dir {} has no basename", unit_dir.display()))?;
        let manifest_path = unit_dir.join(format!("{basename}.toml"));
        let contents = fs::read_to_string(&manifest_path)
            .with_context(|| format!("read unit manifest {}", manifest_path.display()))?;
        let manifest: UnitManifest = toml::from_str(&contents)
            .with_context(|| format!("parse unit manifest {}", manifest_path.display()))?;
        if manifest.command.is_empty() || manifest.command[0].trim().is_empty() {
            return Err(anyhow!(
                "unit manifest {} has an empty command",
                manifest_path.display()
            ));
        }
        Ok(manifest)
    }
}

impl Engine for ProcessEngine {
    #[instrument(skip_all, fields(unit = %unit.id, tag = %unit.tag))]
    fn run_unit(&self, root: &Path, unit: &Unit) -> Result<UnitReport> {
        let start = Instant::now();
        let unit_dir = root.join(&unit.id);
        let manifest = Self::load_manifest(&unit_dir)?;
        let timeout = Duration::from_secs(manifest.timeout_secs.unwrap_or(unit.timeout_secs));

        info!(timeout_secs = timeout.as_secs(), "running unit");
        let mut cmd = Command::new(&manifest.command[0]);
        cmd.args(&manifest.command[1..])
            .current_dir(&unit_dir)
            .env(SUPPORT_DIR_ENV, &self.support_dir);

        let output = run_command_with_timeout(cmd, timeout, self.output_limit_bytes)
            .with_context(|| format!("run unit {}", unit.id))?;

        write_unit_log(root, unit, &output.render_log(&unit.tag))?;

        let outcome = if output.timed_out {
            warn!(timeout_secs = timeout.as_secs(), "unit timed out");
            UnitOutcome::Timeout
        } else if output.status.success() {
            UnitOutcome::Pass
        } else {
            warn!(exit_code = ?output.status.code(), "unit failed");
            UnitOutcome::Fail
        };

        Ok(UnitReport {
            outcome,
            exit_code: output.status.code(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn write_unit_log(root: &Path, unit: &Unit, contents: &str) -> Result<()> {
    let log_path = root.join(".harness/logs").join(format!("{}.log", unit.tag));
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create unit log dir {}", parent.display()))?;
    }
    fs::write(&log_path, contents)
        .with_context(|| format!("write unit log {}", log_path.display()))
}
