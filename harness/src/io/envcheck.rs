//! Environment checker invocation.
//!
//! The checker is an opaque external command taking two configuration paths
//! (base defaults, then custom overrides). It runs before the first unit and
//! after every unit. Environment drift is a signal, not a suite-stopping
//! fault, so a failed check is logged with attribution and the suite keeps
//! going unless the operator configured `envcheck.fatal = true`.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::core::plan::CheckContext;
use crate::io::config::EnvCheckConfig;
use crate::io::process::run_command_with_timeout;

/// Outcome of one checker invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Pass,
    Fail,
}

/// Abstraction over environment checker backends.
pub trait CheckRunner {
    fn check(&self, context: &CheckContext) -> Result<CheckOutcome>;
}

/// Checker that spawns the configured external command.
pub struct CommandCheckRunner {
    command: Vec<String>,
    base_config: PathBuf,
    custom_config: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
    workdir: PathBuf,
}

impl CommandCheckRunner {
    pub fn new(root: &Path, cfg: &EnvCheckConfig, output_limit_bytes: usize) -> Self {
        Self {
            command: cfg.command.clone(),
            base_config: root.join(&cfg.base_config),
            custom_config: root.join(&cfg.custom_config),
            timeout: Duration::from_secs(cfg.timeout_secs),
            output_limit_bytes,
            workdir: root.to_path_buf(),
        }
    }
}

impl CheckRunner for CommandCheckRunner {
    #[instrument(skip_all, fields(point = %context.label()))]
    fn check(&self, context: &CheckContext) -> Result<CheckOutcome> {
        let exe = self
            .command
            .first()
            .ok_or_else(|| anyhow!("envcheck command is empty"))?;
        let mut cmd = Command::new(exe);
        // Both config layers are passed by path and read fresh by the
        // checker on every invocation; nothing is cached between checks.
        cmd.args(&self.command[1..])
            .arg(&self.base_config)
            .arg(&self.custom_config)
            .current_dir(&self.workdir);

        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes)
            .context("run environment checker")?;

        if output.timed_out || !output.status.success() {
            warn!(
                exit_code = ?output.status.code(),
                timed_out = output.timed_out,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "environment check failed"
            );
            return Ok(CheckOutcome::Fail);
        }
        debug!("environment check passed");
        Ok(CheckOutcome::Pass)
    }
}

/// Run one scheduled check and apply the configured failure policy.
///
/// A failed or unlaunchable checker is attributed to its scheduling point
/// and swallowed unless `fatal` is set; never retried.
pub fn run_check<R: CheckRunner>(runner: &R, context: &CheckContext, fatal: bool) -> Result<()> {
    let outcome = match runner.check(context) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(point = %context.label(), err = %err, "environment checker did not launch");
            CheckOutcome::Fail
        }
    };
    if outcome == CheckOutcome::Fail {
        if fatal {
            return Err(anyhow!(
                "environment check failed at {} (envcheck.fatal = true)",
                context.label()
            ));
        }
        warn!(point = %context.label(), "continuing despite failed environment check");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeCheckRunner;

    #[test]
    fn failed_check_is_non_fatal_by_default() {
        let runner = FakeCheckRunner::failing();
        let context = CheckContext::PostUnit {
            unit_id: "subtests/a".to_string(),
        };
        run_check(&runner, &context, false).expect("non-fatal");
        assert_eq!(runner.calls(), vec!["post-unit subtests/a".to_string()]);
    }

    #[test]
    fn failed_check_aborts_when_configured_fatal() {
        let runner = FakeCheckRunner::failing();
        let err = run_check(&runner, &CheckContext::PreSuite, true).unwrap_err();
        assert!(err.to_string().contains("pre-suite"));
    }

    #[test]
    fn launch_error_is_treated_as_failure_not_panic() {
        let runner = FakeCheckRunner::erroring();
        run_check(&runner, &CheckContext::PreSuite, false).expect("non-fatal");
    }

    #[test]
    fn command_runner_reports_nonzero_exit_as_fail() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = EnvCheckConfig {
            command: vec!["sh".to_string(), "-c".to_string(), "exit 1".to_string()],
            ..EnvCheckConfig::default()
        };
        let runner = CommandCheckRunner::new(temp.path(), &cfg, 1000);
        let outcome = runner.check(&CheckContext::PreSuite).expect("check");
        assert_eq!(outcome, CheckOutcome::Fail);
    }

    #[test]
    fn command_runner_passes_both_config_paths() {
        let temp = tempfile::tempdir().expect("tempdir");
        let marker = temp.path().join("args.txt");
        let cfg = EnvCheckConfig {
            command: vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("echo \"$0 $1\" > {}", marker.display()),
            ],
            ..EnvCheckConfig::default()
        };
        let runner = CommandCheckRunner::new(temp.path(), &cfg, 1000);
        let outcome = runner.check(&CheckContext::PreSuite).expect("check");
        assert_eq!(outcome, CheckOutcome::Pass);

        let recorded = std::fs::read_to_string(&marker).expect("read marker");
        assert!(recorded.contains("config/defaults.ini"));
        assert!(recorded.contains("config/custom.ini"));
    }
}
