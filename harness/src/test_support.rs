//! Test-only helpers: suite fixtures on disk and scripted fakes.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::core::plan::CheckContext;
use crate::core::unit::{Unit, UnitOutcome, UnitReport};
use crate::io::config::HarnessConfig;
use crate::io::discover::{SUBTESTS_DIR, UNIT_MANIFEST_SUFFIX};
use crate::io::engine::Engine;
use crate::io::envcheck::{CheckOutcome, CheckRunner};

/// Build a unit without going through discovery.
pub fn unit(id: &str, tag: &str, timeout_secs: u64) -> Unit {
    Unit {
        id: id.to_string(),
        tag: tag.to_string(),
        timeout_secs,
    }
}

/// Config with the operator-visibility delay disabled for tests.
pub fn suite_config() -> HarnessConfig {
    HarnessConfig {
        mismatch_delay_secs: 0,
        ..HarnessConfig::default()
    }
}

/// Create `subtests/<name>` with a trivially passing manifest.
pub fn make_unit_dir(root: &Path, name: &str) {
    make_unit_dir_with_command(root, name, &["true"], None);
}

/// Create `subtests/<name>` with an explicit manifest command.
pub fn make_unit_dir_with_command(
    root: &Path,
    name: &str,
    command: &[&str],
    timeout_secs: Option<u64>,
) {
    let dir = root.join(SUBTESTS_DIR).join(name);
    fs::create_dir_all(&dir).expect("create unit dir");
    let basename = dir
        .file_name()
        .and_then(|n| n.to_str())
        .expect("unit basename");

    let args = command
        .iter()
        .map(|part| format!("\"{}\"", part.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(", ");
    let mut manifest = format!("command = [{args}]\n");
    if let Some(secs) = timeout_secs {
        manifest.push_str(&format!("timeout_secs = {secs}\n"));
    }
    fs::write(
        dir.join(format!("{basename}{UNIT_MANIFEST_SUFFIX}")),
        manifest,
    )
    .expect("write unit manifest");
}

/// Create `support/support.toml` declaring the given api version.
pub fn make_support_dir(root: &Path, api_version: &str) -> PathBuf {
    let dir = root.join("support");
    fs::create_dir_all(&dir).expect("create support dir");
    fs::write(
        dir.join("support.toml"),
        format!("api_version = \"{api_version}\"\n"),
    )
    .expect("write support manifest");
    dir
}

/// Create `docs/conf.py` declaring the given documentation version.
pub fn write_doc_conf(root: &Path, version: &str) {
    let dir = root.join("docs");
    fs::create_dir_all(&dir).expect("create docs dir");
    fs::write(
        dir.join("conf.py"),
        format!("project = 'suite'\nversion = '{version}'\nrelease = '{version}'\n"),
    )
    .expect("write doc conf");
}

/// Scripted engine that records calls and returns predetermined reports.
#[derive(Default)]
pub struct FakeEngine {
    fail_ids: Vec<String>,
    error_ids: Vec<String>,
    calls: RefCell<Vec<String>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `Fail` for the given unit id.
    pub fn failing_on(mut self, id: &str) -> Self {
        self.fail_ids.push(id.to_string());
        self
    }

    /// Return an engine-level error for the given unit id.
    pub fn erroring_on(mut self, id: &str) -> Self {
        self.error_ids.push(id.to_string());
        self
    }

    /// Unit ids in the order they were run.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Engine for FakeEngine {
    fn run_unit(&self, _root: &Path, unit: &Unit) -> Result<UnitReport> {
        self.calls.borrow_mut().push(unit.id.clone());
        if self.error_ids.iter().any(|id| id == &unit.id) {
            return Err(anyhow!("engine failure for {}", unit.id));
        }
        let outcome = if self.fail_ids.iter().any(|id| id == &unit.id) {
            UnitOutcome::Fail
        } else {
            UnitOutcome::Pass
        };
        Ok(UnitReport {
            outcome,
            exit_code: Some(i32::from(outcome != UnitOutcome::Pass)),
            duration_ms: 1,
        })
    }
}

enum CheckBehavior {
    Pass,
    Fail,
    Error,
}

/// Scripted environment checker that records attribution labels.
pub struct FakeCheckRunner {
    behavior: CheckBehavior,
    calls: RefCell<Vec<String>>,
}

impl FakeCheckRunner {
    pub fn passing() -> Self {
        Self {
            behavior: CheckBehavior::Pass,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: CheckBehavior::Fail,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn erroring() -> Self {
        Self {
            behavior: CheckBehavior::Error,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Attribution labels in the order checks were invoked.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CheckRunner for FakeCheckRunner {
    fn check(&self, context: &CheckContext) -> Result<CheckOutcome> {
        self.calls.borrow_mut().push(context.label());
        match self.behavior {
            CheckBehavior::Pass => Ok(CheckOutcome::Pass),
            CheckBehavior::Fail => Ok(CheckOutcome::Fail),
            CheckBehavior::Error => Err(anyhow!("checker could not be launched")),
        }
    }
}
