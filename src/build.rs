//! The external build step that produces the candidate binaries.

use std::process::Stdio;

use tracing::info;

use crate::config::BuildConfig;
use crate::errors::{HarnessError, Result};

/// Runs the build command in its configured directory and waits for it.
///
/// Output goes straight to the console. Anything but a zero exit status is
/// fatal: without fresh candidate binaries no comparison means anything.
pub fn run_build(build: &BuildConfig) -> Result<()> {
    let stage = build.command();
    info!(program = %stage.display_program(), dir = %build.dir.display(), "building candidate");
    let status = stage
        .command()
        .current_dir(&build.dir)
        .stdin(Stdio::null())
        .status()
        .map_err(|source| HarnessError::BuildSpawn {
            program: stage.display_program(),
            dir: build.dir.clone(),
            source,
        })?;
    if !status.success() {
        return Err(HarnessError::Build {
            program: stage.display_program(),
            dir: build.dir.clone(),
            status,
        });
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn sh_build(script: &str, dir: PathBuf) -> BuildConfig {
        BuildConfig {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), script.to_string()],
            dir,
        }
    }

    #[test]
    fn build_runs_in_configured_directory() {
        let root = tempfile::tempdir().unwrap();
        let src = root.path().join("src");
        fs::create_dir(&src).unwrap();

        run_build(&sh_build("echo built > marker", src.clone())).unwrap();
        assert!(src.join("marker").is_file());
        assert!(!root.path().join("marker").exists());
    }

    #[test]
    fn failing_build_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let err = run_build(&sh_build("exit 2", root.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, HarnessError::Build { .. }));
    }

    #[test]
    fn missing_build_directory_is_spawn_error() {
        let root = tempfile::tempdir().unwrap();
        let err = run_build(&sh_build("true", root.path().join("absent"))).unwrap_err();
        assert!(matches!(err, HarnessError::BuildSpawn { .. }));
    }
}
