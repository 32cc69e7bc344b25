//! Subtest discovery by directory convention.
//!
//! A directory under `<root>/subtests` is a unit iff it directly contains a
//! manifest named after the directory itself (`foo/foo.toml`). Anything else
//! is silently skipped; malformed trees are a discovery non-event, not an
//! error.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Directory under the suite root that holds all unit trees.
pub const SUBTESTS_DIR: &str = "subtests";

/// Suffix appended to a directory's basename to form its manifest name.
pub const UNIT_MANIFEST_SUFFIX: &str = ".toml";

/// Resolve the unit id set for this run.
///
/// With an explicit comma-separated `selection`, discovery is bypassed and
/// each name is mapped onto the `subtests/` prefix with no filesystem
/// validation; a bad name surfaces later as that unit's execution failure.
pub fn resolve_units(root: &Path, selection: Option<&str>) -> Result<Vec<String>> {
    match selection {
        Some(names) => Ok(names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| format!("{SUBTESTS_DIR}/{name}"))
            .collect()),
        None => discover_units(root),
    }
}

/// Walk `<root>/subtests` and return all unit ids in stable sorted order.
pub fn discover_units(root: &Path) -> Result<Vec<String>> {
    let subtests = root.join(SUBTESTS_DIR);
    let mut units = Vec::new();
    if subtests.is_dir() {
        walk(&subtests, &subtests, &mut units)?;
    }
    // Sort for reproducible sequencing and tagging across runs.
    units.sort();
    debug!(count = units.len(), "discovered units");
    Ok(units)
}

fn walk(base: &Path, dir: &Path, units: &mut Vec<String>) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read dir entry in {}", dir.display()))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if is_unit_dir(&path)
            && let Some(id) = unit_id(base, &path)
        {
            units.push(id);
        }
        // A unit directory may still contain nested units (e.g. grouping
        // directories like `docker_cli/` never qualify themselves).
        walk(base, &path, units)?;
    }
    Ok(())
}

fn is_unit_dir(dir: &Path) -> bool {
    let Some(basename) = dir.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    dir.join(format!("{basename}{UNIT_MANIFEST_SUFFIX}")).is_file()
}

fn unit_id(base: &Path, dir: &Path) -> Option<String> {
    let relative = dir.strip_prefix(base).ok()?;
    let mut id = String::from(SUBTESTS_DIR);
    for component in relative.components() {
        id.push('/');
        id.push_str(component.as_os_str().to_str()?);
    }
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::make_unit_dir;

    #[test]
    fn discovers_dirs_with_matching_manifest() {
        let temp = tempfile::tempdir().expect("tempdir");
        make_unit_dir(temp.path(), "docker_cli/run");
        make_unit_dir(temp.path(), "docker_cli/build");

        let units = discover_units(temp.path()).expect("discover");
        assert_eq!(
            units,
            vec![
                "subtests/docker_cli/build".to_string(),
                "subtests/docker_cli/run".to_string(),
            ]
        );
    }

    #[test]
    fn excludes_dirs_without_matching_manifest() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bar = temp.path().join(SUBTESTS_DIR).join("foo/bar");
        fs::create_dir_all(&bar).expect("create dirs");
        fs::write(bar.join("notbar.toml"), "").expect("write");

        let units = discover_units(temp.path()).expect("discover");
        assert!(units.is_empty());
    }

    #[test]
    fn repeated_discovery_is_deterministic() {
        let temp = tempfile::tempdir().expect("tempdir");
        for name in ["c", "a", "b"] {
            make_unit_dir(temp.path(), name);
        }

        let first = discover_units(temp.path()).expect("discover");
        let second = discover_units(temp.path()).expect("discover");
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                "subtests/a".to_string(),
                "subtests/b".to_string(),
                "subtests/c".to_string(),
            ]
        );
    }

    #[test]
    fn missing_subtests_dir_yields_empty_set() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(discover_units(temp.path()).expect("discover").is_empty());
    }

    #[test]
    fn explicit_list_bypasses_discovery_and_validation() {
        let temp = tempfile::tempdir().expect("tempdir");
        make_unit_dir(temp.path(), "a");

        let units = resolve_units(temp.path(), Some("a, c")).expect("resolve");
        assert_eq!(
            units,
            vec!["subtests/a".to_string(), "subtests/c".to_string()]
        );
    }

    #[test]
    fn absent_selection_falls_back_to_discovery() {
        let temp = tempfile::tempdir().expect("tempdir");
        make_unit_dir(temp.path(), "a");

        let units = resolve_units(temp.path(), None).expect("resolve");
        assert_eq!(units, vec!["subtests/a".to_string()]);
    }
}
