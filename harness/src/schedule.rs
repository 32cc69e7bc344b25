//! Plan construction and the single dispatch loop that interprets it.
//!
//! Control flow is strictly sequential: one action at a time, in plan order.
//! The loop owns the support registry and lends it to the isolation boundary
//! for exactly one unit at a time.

use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::core::plan::{Action, build_plan};
use crate::core::unit::{Unit, UnitOutcome, units_from_ids};
use crate::io::config::HarnessConfig;
use crate::io::discover::resolve_units;
use crate::io::engine::Engine;
use crate::io::envcheck::{CheckRunner, run_check};
use crate::io::support::SupportRegistry;
use crate::isolate;

/// Recorded result for one scheduled unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitResult {
    pub unit: Unit,
    pub outcome: UnitOutcome,
    /// Engine/isolation error detail when the unit could not be run.
    pub detail: Option<String>,
}

/// Aggregate of all per-unit results for one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteOutcome {
    pub results: Vec<UnitResult>,
}

impl SuiteOutcome {
    pub fn passed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.outcome == UnitOutcome::Pass)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Resolve the unit set and build the ordered plan for it.
pub fn plan_suite(
    root: &Path,
    cfg: &HarnessConfig,
    selection: Option<&str>,
) -> Result<(Vec<Unit>, Vec<Action>)> {
    let ids = resolve_units(root, selection)?;
    let units = units_from_ids(&ids, cfg.default_timeout_secs);
    let plan = build_plan(&units);
    Ok((units, plan))
}

/// Build the plan and execute every scheduled action in order.
///
/// A failing unit (or a unit the engine cannot run) is recorded and the loop
/// continues; only a fatal environment check (when configured) aborts the
/// suite.
pub fn run_suite<E: Engine, C: CheckRunner>(
    root: &Path,
    cfg: &HarnessConfig,
    selection: Option<&str>,
    engine: &E,
    checker: &C,
) -> Result<SuiteOutcome> {
    let (units, plan) = plan_suite(root, cfg, selection)?;
    info!(units = units.len(), actions = plan.len(), "suite plan built");

    let mut registry = SupportRegistry::new();
    let mut results = Vec::with_capacity(units.len());

    for action in &plan {
        match action {
            Action::EnvCheck { context } => {
                run_check(checker, context, cfg.envcheck.fatal)?;
            }
            Action::RunUnit { unit } => {
                let result = match isolate::run_unit(engine, &mut registry, root, cfg, unit) {
                    Ok(report) => {
                        info!(unit = %unit.id, outcome = ?report.outcome, duration_ms = report.duration_ms, "unit finished");
                        UnitResult {
                            unit: unit.clone(),
                            outcome: report.outcome,
                            detail: None,
                        }
                    }
                    Err(err) => {
                        warn!(unit = %unit.id, err = %err, "unit could not be executed");
                        UnitResult {
                            unit: unit.clone(),
                            outcome: UnitOutcome::Error,
                            detail: Some(format!("{err:#}")),
                        }
                    }
                };
                results.push(result);
            }
        }
    }

    let outcome = SuiteOutcome { results };
    info!(
        passed = outcome.passed_count(),
        failed = outcome.failed_count(),
        "suite complete"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plan::CheckContext;
    use crate::test_support::{
        FakeCheckRunner, FakeEngine, make_support_dir, make_unit_dir, suite_config, write_doc_conf,
    };

    fn suite_root() -> tempfile::TempDir {
        let temp = tempfile::tempdir().expect("tempdir");
        for name in ["a", "b", "c"] {
            make_unit_dir(temp.path(), name);
        }
        make_support_dir(temp.path(), "1.2.0");
        write_doc_conf(temp.path(), "1.2.0");
        temp
    }

    #[test]
    fn explicit_selection_runs_exactly_the_named_units() {
        let temp = suite_root();
        let cfg = suite_config();
        let engine = FakeEngine::new();
        let checker = FakeCheckRunner::passing();

        let (units, plan) = plan_suite(temp.path(), &cfg, Some("a,c")).expect("plan");
        assert_eq!(plan.len(), 5);
        assert_eq!(
            units.iter().map(|unit| unit.id.clone()).collect::<Vec<_>>(),
            vec!["subtests/a".to_string(), "subtests/c".to_string()]
        );

        let outcome =
            run_suite(temp.path(), &cfg, Some("a,c"), &engine, &checker).expect("run suite");
        assert!(outcome.all_passed());
        assert_eq!(
            engine.calls(),
            vec!["subtests/a".to_string(), "subtests/c".to_string()]
        );
    }

    #[test]
    fn checks_are_attributed_to_their_scheduling_points() {
        let temp = suite_root();
        let cfg = suite_config();
        let engine = FakeEngine::new();
        let checker = FakeCheckRunner::passing();

        run_suite(temp.path(), &cfg, Some("a,c"), &engine, &checker).expect("run suite");
        assert_eq!(
            checker.calls(),
            vec![
                CheckContext::PreSuite.label(),
                "post-unit subtests/a".to_string(),
                "post-unit subtests/c".to_string(),
            ]
        );
    }

    #[test]
    fn failing_checker_does_not_stop_the_suite() {
        let temp = suite_root();
        let cfg = suite_config();
        let engine = FakeEngine::new();
        let checker = FakeCheckRunner::failing();

        let outcome = run_suite(temp.path(), &cfg, None, &engine, &checker).expect("run suite");
        assert_eq!(outcome.results.len(), 3);
        assert!(outcome.all_passed());
    }

    #[test]
    fn fatal_checker_policy_aborts_before_any_unit() {
        let temp = suite_root();
        let mut cfg = suite_config();
        cfg.envcheck.fatal = true;
        let engine = FakeEngine::new();
        let checker = FakeCheckRunner::failing();

        let err = run_suite(temp.path(), &cfg, None, &engine, &checker).unwrap_err();
        assert!(err.to_string().contains("pre-suite"));
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn engine_error_is_recorded_and_the_suite_continues() {
        let temp = suite_root();
        let cfg = suite_config();
        let engine = FakeEngine::new().erroring_on("subtests/b");
        let checker = FakeCheckRunner::passing();

        let outcome = run_suite(temp.path(), &cfg, None, &engine, &checker).expect("run suite");
        assert_eq!(outcome.failed_count(), 1);
        assert_eq!(outcome.results[1].outcome, UnitOutcome::Error);
        assert!(
            outcome.results[1]
                .detail
                .as_deref()
                .is_some_and(|detail| detail.contains("engine failure"))
        );
        // The failing unit did not prevent the remaining unit from running.
        assert_eq!(outcome.results[2].outcome, UnitOutcome::Pass);
    }

    #[test]
    fn failed_units_drive_the_aggregate_counts() {
        let temp = suite_root();
        let cfg = suite_config();
        let engine = FakeEngine::new().failing_on("subtests/a");
        let checker = FakeCheckRunner::passing();

        let outcome = run_suite(temp.path(), &cfg, None, &engine, &checker).expect("run suite");
        assert_eq!(outcome.passed_count(), 2);
        assert_eq!(outcome.failed_count(), 1);
        assert!(!outcome.all_passed());
    }
}
