//! Test case discovery.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// One source file to feed through both variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub path: PathBuf,
    /// File name with its extension stripped; keys artifacts and report labels.
    pub name: String,
}

impl TestCase {
    /// Returns `None` for paths with no file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = case_name(&path)?;
        Some(Self { path, name })
    }
}

/// Final path component up to its first `.`, so `cases/foo.cl` and
/// `cases/foo.bak.cl` are both named `foo`. A dot file such as `.neg.cl` gets
/// the empty name. `None` only when the path has no file name at all.
pub fn case_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_string_lossy();
    let stem = file_name.split('.').next().unwrap_or_default();
    Some(stem.to_string())
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension() == Some(OsStr::new(extension))
}

/// Lists the files directly inside `dir` whose extension is `extension`.
///
/// A missing or unreadable directory contributes no cases. The listing is
/// sorted so runs are reproducible.
pub fn discover_in<P: AsRef<Path>>(dir: P, extension: &str) -> Vec<TestCase> {
    let dir = dir.as_ref();
    let mut cases = Vec::new();
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "case directory not present");
        return cases;
    }
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable case directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_extension(entry.path(), extension) {
            continue;
        }
        match TestCase::from_path(entry.path()) {
            Some(case) => cases.push(case),
            None => warn!(path = %entry.path().display(), "skipping case file with no name"),
        }
    }
    debug!(dir = %dir.display(), found = cases.len(), "scanned case directory");
    cases
}

/// Concatenates the cases of every source directory in order.
///
/// A case name may appear in more than one directory; each occurrence is kept
/// and run on its own.
pub fn discover<I, P>(dirs: I, extension: &str) -> Vec<TestCase>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    dirs.into_iter()
        .flat_map(|dir| discover_in(dir, extension))
        .collect()
}
