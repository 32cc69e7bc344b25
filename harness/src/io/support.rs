//! Process-wide support-library registry with scoped, per-unit leases.
//!
//! Sequential unit runs share one harness process, so any support-library
//! state registered for one unit must be gone before the next unit starts.
//! [`SupportLease`] makes that structural: loading inserts the registry
//! entries, and `Drop` purges every entry under the library's namespace on
//! all exit paths, including error propagation and panics. There is no lock;
//! the registry is owned by the orchestration loop and borrowed for exactly
//! one unit at a time, and units themselves execute as child processes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::core::version::Version;

/// Registered state for one loaded component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportEntry {
    /// Directory the component was loaded from.
    pub path: PathBuf,
}

/// Process-wide mapping from fully-qualified component ids to loaded state.
#[derive(Debug, Default)]
pub struct SupportRegistry {
    entries: BTreeMap<String, SupportEntry>,
}

impl SupportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of registered ids, in stable order.
    pub fn entry_ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Ids whose fully-qualified name contains `namespace`.
    pub fn ids_in_namespace(&self, namespace: &str) -> Vec<String> {
        self.entries
            .keys()
            .filter(|id| id.contains(namespace))
            .cloned()
            .collect()
    }

    fn insert(&mut self, id: String, entry: SupportEntry) {
        debug!(id = %id, "registering support entry");
        let _ = self.entries.insert(id, entry);
    }

    fn remove(&mut self, id: &str) {
        if self.entries.remove(id).is_some() {
            debug!(id, "removed support entry");
        }
    }

    fn purge_namespace(&mut self, namespace: &str) {
        let stale = self.ids_in_namespace(namespace);
        for id in stale {
            self.remove(&id);
        }
    }
}

/// Declared metadata for the support library (`<dir>/support.toml`).
#[derive(Debug, Deserialize)]
struct SupportManifest {
    api_version: String,
}

/// Scoped handle to the support library, loaded fresh for one unit run.
///
/// Holds the registry borrow for its lifetime; dropping the lease restores
/// the registry to its pre-load state for this namespace.
pub struct SupportLease<'a> {
    registry: &'a mut SupportRegistry,
    namespace: String,
    version: Option<Version>,
}

impl<'a> SupportLease<'a> {
    /// Load the support library and its version component into the registry.
    pub fn load(
        registry: &'a mut SupportRegistry,
        dir: &Path,
        namespace: &str,
    ) -> Result<SupportLease<'a>> {
        let manifest_path = dir.join("support.toml");
        let contents = fs::read_to_string(&manifest_path)
            .with_context(|| format!("read support manifest {}", manifest_path.display()))?;
        let manifest: SupportManifest = toml::from_str(&contents)
            .with_context(|| format!("parse support manifest {}", manifest_path.display()))?;
        let version: Version = manifest
            .api_version
            .parse()
            .with_context(|| format!("parse api_version in {}", manifest_path.display()))?;

        registry.insert(
            namespace.to_string(),
            SupportEntry {
                path: dir.to_path_buf(),
            },
        );
        registry.insert(
            format!("{namespace}.version"),
            SupportEntry {
                path: dir.to_path_buf(),
            },
        );

        Ok(SupportLease {
            registry,
            namespace: namespace.to_string(),
            version: Some(version),
        })
    }

    /// Implementation version declared by the freshly loaded library.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Drop the version component before the unit runs.
    ///
    /// The unit must not be able to reach or mutate the version state, so
    /// both the registry entry and the local reference go away here.
    pub fn release_version(&mut self) {
        let id = format!("{}.version", self.namespace);
        self.registry.remove(&id);
        self.version = None;
    }
}

impl Drop for SupportLease<'_> {
    fn drop(&mut self) {
        self.registry.purge_namespace(&self.namespace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::make_support_dir;

    #[test]
    fn load_registers_library_and_version_entries() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = make_support_dir(temp.path(), "1.2.3");
        let mut registry = SupportRegistry::new();

        let lease = SupportLease::load(&mut registry, &dir, "support").expect("load");
        assert_eq!(lease.version(), Some(Version::new(1, 2, 3)));
        drop(lease);
    }

    #[test]
    fn release_version_removes_only_version_entry() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = make_support_dir(temp.path(), "1.2.3");
        let mut registry = SupportRegistry::new();

        let mut lease = SupportLease::load(&mut registry, &dir, "support").expect("load");
        lease.release_version();
        assert_eq!(lease.version(), None);
        assert_eq!(lease.registry.entry_ids(), vec!["support".to_string()]);
    }

    #[test]
    fn drop_restores_pre_load_entry_set() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = make_support_dir(temp.path(), "1.2.3");
        let mut registry = SupportRegistry::new();
        registry.insert(
            "other".to_string(),
            SupportEntry {
                path: temp.path().to_path_buf(),
            },
        );
        let before = registry.entry_ids();

        let lease = SupportLease::load(&mut registry, &dir, "support").expect("load");
        drop(lease);

        assert_eq!(registry.entry_ids(), before);
    }

    #[test]
    fn repeated_load_and_drop_is_idempotent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = make_support_dir(temp.path(), "1.2.3");
        let mut registry = SupportRegistry::new();

        drop(SupportLease::load(&mut registry, &dir, "support").expect("load"));
        let after_first = registry.entry_ids();
        drop(SupportLease::load(&mut registry, &dir, "support").expect("load"));
        assert_eq!(registry.entry_ids(), after_first);
        assert!(registry.entry_ids().is_empty());
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut registry = SupportRegistry::new();
        let result = SupportLease::load(&mut registry, temp.path(), "support");
        assert!(result.is_err());
        drop(result);
        assert!(registry.entry_ids().is_empty());
    }

    #[test]
    fn malformed_api_version_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("support");
        fs::create_dir_all(&dir).expect("create dir");
        fs::write(dir.join("support.toml"), "api_version = \"not-a-version\"\n").expect("write");
        let mut registry = SupportRegistry::new();
        assert!(SupportLease::load(&mut registry, &dir, "support").is_err());
    }
}
