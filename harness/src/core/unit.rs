//! Unit model shared between discovery, planning, and execution.
//!
//! These types are plain data: the external execution engine may persist
//! scheduled actions across process restarts, so nothing here may close over
//! harness state.

use serde::{Deserialize, Serialize};

/// One schedulable test unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Relative identifier, e.g. `subtests/docker_cli/run`.
    pub id: String,
    /// Human-readable sequence tag, e.g. `test_3-of-10`.
    pub tag: String,
    /// Wall-clock budget for this unit in seconds.
    pub timeout_secs: u64,
}

/// Terminal classification of one unit run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitOutcome {
    /// Unit process exited zero.
    Pass,
    /// Unit process exited nonzero.
    Fail,
    /// Unit process was killed after exceeding its timeout.
    Timeout,
    /// The engine could not run the unit at all (missing manifest, spawn
    /// failure, isolation error).
    Error,
}

/// Engine report for one completed unit run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    pub outcome: UnitOutcome,
    /// Exit code when the process terminated normally.
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl UnitReport {
    pub fn passed(&self) -> bool {
        self.outcome == UnitOutcome::Pass
    }
}

/// Assign sequence tags and the default timeout to an ordered id list.
///
/// Tags are 1-based so operators can line logs up with "N of TOTAL" counts.
pub fn units_from_ids(ids: &[String], default_timeout_secs: u64) -> Vec<Unit> {
    let total = ids.len();
    ids.iter()
        .enumerate()
        .map(|(index, id)| Unit {
            id: id.clone(),
            tag: format!("test_{}-of-{}", index + 1, total),
            timeout_secs: default_timeout_secs,
        })
        .collect()
}
