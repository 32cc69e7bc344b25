//! Ordered execution plan: test steps interleaved with environment checks.
//!
//! A plan is built once per orchestration run and never mutated afterwards.
//! Actions carry only plain data fields and are interpreted by the single
//! dispatch loop in [`crate::schedule`]; this keeps every action
//! independently serializable for engines that checkpoint scheduled work.

use serde::{Deserialize, Serialize};

use crate::core::unit::Unit;

/// Attribution context for one environment check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "point", rename_all = "snake_case")]
pub enum CheckContext {
    /// Check scheduled before the first unit.
    PreSuite,
    /// Check scheduled after the named unit.
    PostUnit { unit_id: String },
}

impl CheckContext {
    /// Operator-facing label used when logging check failures.
    pub fn label(&self) -> String {
        match self {
            Self::PreSuite => "pre-suite".to_string(),
            Self::PostUnit { unit_id } => format!("post-unit {unit_id}"),
        }
    }
}

/// One scheduled action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    EnvCheck { context: CheckContext },
    RunUnit { unit: Unit },
}

/// Build the full ordered plan for the given units.
///
/// Shape invariant: one pre-suite check, then `(run-unit, post-check)` per
/// unit, so the plan always holds `2N + 1` actions.
pub fn build_plan(units: &[Unit]) -> Vec<Action> {
    let mut plan = Vec::with_capacity(1 + 2 * units.len());
    plan.push(Action::EnvCheck {
        context: CheckContext::PreSuite,
    });
    for unit in units {
        plan.push(Action::RunUnit { unit: unit.clone() });
        plan.push(Action::EnvCheck {
            context: CheckContext::PostUnit {
                unit_id: unit.id.clone(),
            },
        });
    }
    plan
}
