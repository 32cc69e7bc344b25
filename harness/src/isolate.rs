//! Execution isolation boundary for a single unit run.
//!
//! Sequential runs share one harness process. Each unit gets a fresh support
//! lease whose drop restores the registry, so nothing a unit's support load
//! contributes can leak into the next run, whether the unit passes, fails,
//! or the engine errors out.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, instrument};

use crate::core::unit::{Unit, UnitReport};
use crate::core::version::{Version, scan_declared_version};
use crate::io::config::HarnessConfig;
use crate::io::engine::Engine;
use crate::io::support::{SupportLease, SupportRegistry};

/// Run exactly one unit inside the isolation boundary.
///
/// Protocol: load the support library fresh, gate on version consistency,
/// drop the version component so the unit cannot reach it, delegate to the
/// engine, and purge the registry afterwards on every exit path. Engine
/// failures propagate to the caller only after cleanup has run.
#[instrument(skip_all, fields(unit = %unit.id, tag = %unit.tag))]
pub fn run_unit<E: Engine>(
    engine: &E,
    registry: &mut SupportRegistry,
    root: &Path,
    cfg: &HarnessConfig,
    unit: &Unit,
) -> Result<UnitReport> {
    let namespace = cfg.support.namespace.as_str();
    let result = {
        let mut lease = SupportLease::load(registry, &root.join(&cfg.support.dir), namespace)?;
        version_gate(root, cfg, lease.version());
        // The version component must be unreachable while the unit runs.
        lease.release_version();
        engine.run_unit(root, unit)
        // Lease drops here: all namespace entries are purged regardless of
        // the engine's outcome.
    };

    let residual = registry.ids_in_namespace(namespace);
    if !residual.is_empty() {
        error!(?residual, "support registry not clean after unit run");
    }
    result
}

/// Compare the declared documentation version against the implementation.
///
/// Mismatch is loud but never fatal: one high-visibility diagnostic plus a
/// configurable delay so the message is not scrolled past. Returns whether
/// the versions were consistent (or the gate was skipped).
pub fn version_gate(root: &Path, cfg: &HarnessConfig, impl_version: Option<Version>) -> bool {
    let source = root.join(&cfg.doc_version_source);
    let Ok(text) = fs::read_to_string(&source) else {
        debug!(source = %source.display(), "no documentation version source, skipping gate");
        return true;
    };
    let Some(doc_version) = scan_declared_version(&text) else {
        debug!(source = %source.display(), "no declared version found, skipping gate");
        return true;
    };
    let Some(impl_version) = impl_version else {
        debug!("support library declared no version, skipping gate");
        return true;
    };

    if doc_version.compare(&impl_version) == Ordering::Equal {
        debug!(version = %impl_version, "documentation and implementation versions agree");
        return true;
    }

    error!(
        documentation = %doc_version,
        implementation = %impl_version,
        "DOCUMENTATION VERSION DOES NOT MATCH IMPLEMENTATION API VERSION"
    );
    if cfg.mismatch_delay_secs > 0 {
        // Deliberate pause so the operator actually sees the diagnostic.
        thread::sleep(Duration::from_secs(cfg.mismatch_delay_secs));
    }
    false
}
