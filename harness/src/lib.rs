//! Sequential test-suite harness for containerized CLI integration tests.
//!
//! The harness discovers test units under `subtests/`, builds an ordered plan
//! of actions (environment checks interleaved with unit runs), and executes
//! each unit in isolation with a timeout behind a documentation/behavior
//! version-consistency gate. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (plan construction, unit
//!   modelling, version parsing). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (discovery, config, process
//!   execution, the support-library registry). Isolated to enable mocking
//!   in tests.
//!
//! Orchestration modules ([`isolate`], [`schedule`]) coordinate core logic
//! with I/O to implement the CLI commands.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod isolate;
pub mod logging;
pub mod schedule;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
