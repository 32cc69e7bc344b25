//! Stable exit codes for harness CLI commands.

/// Command succeeded; for `harness run`, every unit passed.
pub const OK: i32 = 0;
/// Command failed due to invalid config/layout or another harness error.
pub const INVALID: i32 = 1;
/// `harness run` completed but at least one unit failed, timed out, or
/// could not be executed.
pub const UNIT_FAILED: i32 = 2;
