//! Development-time tracing for debugging the harness.
//!
//! Operator-facing diagnostics (version mismatches, failed environment
//! checks) go through `tracing` as well; per-unit process output is
//! persisted separately under `.harness/logs/` and is unaffected by
//! `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for harness logging.
///
/// Reads `RUST_LOG` env var. Defaults to `info` if unset so suite progress
/// and non-fatal failures are visible by default.
/// Output: stderr, compact format.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
