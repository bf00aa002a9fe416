//! Scratch directory and artifact files.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{HarnessError, Result};

/// Extension shared by every artifact.
pub const ARTIFACT_EXTENSION: &str = "out";

/// `{scratch}/{case_name}_{label}.out`.
pub fn artifact_path(scratch: &Path, case_name: &str, label: &str) -> PathBuf {
    scratch.join(format!("{}_{}.{}", case_name, label, ARTIFACT_EXTENSION))
}

/// Creates `scratch` if needed and removes everything inside it.
///
/// Runs before any case so no artifact from an earlier run can be compared.
pub fn prepare_scratch(scratch: &Path) -> Result<()> {
    fs::create_dir_all(scratch).map_err(|e| HarnessError::scratch(scratch, "create", e))?;
    let entries = fs::read_dir(scratch).map_err(|e| HarnessError::scratch(scratch, "list", e))?;
    let mut removed = 0usize;
    for entry in entries {
        let entry = entry.map_err(|e| HarnessError::scratch(scratch, "list", e))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| HarnessError::scratch(&path, "inspect", e))?;
        let outcome = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        outcome.map_err(|e| HarnessError::scratch(&path, "remove", e))?;
        removed += 1;
    }
    debug!(scratch = %scratch.display(), removed, "scratch directory cleared");
    Ok(())
}

/// Opens a fresh artifact, truncating anything already at `path`.
pub fn create_artifact(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| HarnessError::artifact(path, "create", e))
}

/// Reads a finished artifact.
pub fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| HarnessError::artifact(path, "read", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Write;

    #[test]
    fn artifact_paths_differ_only_by_label() {
        let scratch = Path::new("temp");
        assert_eq!(artifact_path(scratch, "foo", "my"), PathBuf::from("temp/foo_my.out"));
        assert_eq!(artifact_path(scratch, "foo", "ref"), PathBuf::from("temp/foo_ref.out"));
    }

    #[test]
    fn distinct_pairs_map_to_distinct_paths() {
        let scratch = Path::new("temp");
        let names = ["foo", "foo_my", "foo_ref", "my", "ref", "a_b"];
        let labels = ["my", "ref"];
        let mut seen = HashSet::new();
        for name in names {
            for label in labels {
                assert!(seen.insert(artifact_path(scratch, name, label)));
            }
        }
    }

    #[test]
    fn prepare_creates_missing_scratch() {
        let root = tempfile::tempdir().unwrap();
        let scratch = root.path().join("temp");
        prepare_scratch(&scratch).unwrap();
        assert!(scratch.is_dir());
        assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[test]
    fn prepare_empties_existing_scratch() {
        let root = tempfile::tempdir().unwrap();
        let scratch = root.path().join("temp");
        fs::create_dir_all(scratch.join("leftover")).unwrap();
        fs::write(scratch.join("old_my.out"), "stale").unwrap();
        fs::write(scratch.join("leftover/inner.out"), "stale").unwrap();

        prepare_scratch(&scratch).unwrap();
        assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);

        prepare_scratch(&scratch).unwrap();
        assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[test]
    fn prepare_fails_when_scratch_is_a_file() {
        let root = tempfile::tempdir().unwrap();
        let scratch = root.path().join("temp");
        fs::write(&scratch, "not a directory").unwrap();
        let err = prepare_scratch(&scratch).unwrap_err();
        assert!(matches!(err, HarnessError::Scratch { .. }));
    }

    #[test]
    fn create_truncates_previous_content() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("foo_my.out");
        fs::write(&path, "previous run output that is long").unwrap();
        let mut file = create_artifact(&path).unwrap();
        file.write_all(b"new").unwrap();
        drop(file);
        assert_eq!(read_artifact(&path).unwrap(), b"new");
    }
}
