//! Harness error taxonomy.
//!
//! Only failures of the harness itself live here. A lexer or parser stage that
//! crashes, exits non-zero, or cannot be started is not an error: whatever it
//! emitted (or the start message written in its place) becomes artifact data
//! and shows up in the diff.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for every condition that halts a harness run.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    /// The build collaborator could not be started.
    #[error("failed to start build command '{program}' in '{}'", .dir.display())]
    #[diagnostic(
        code(frontdiff::build),
        help("check that the build program is installed and the build directory exists")
    )]
    BuildSpawn {
        program: String,
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The build collaborator ran and reported failure.
    #[error("build command '{program}' in '{}' failed with {status}", .dir.display())]
    #[diagnostic(
        code(frontdiff::build),
        help("no case can be compared without candidate binaries; fix the build first")
    )]
    Build {
        program: String,
        dir: PathBuf,
        status: ExitStatus,
    },

    /// The scratch directory could not be created, listed, or cleared.
    #[error("scratch directory error at '{}': {action}", .path.display())]
    #[diagnostic(code(frontdiff::scratch))]
    Scratch {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: io::Error,
    },

    /// An artifact file could not be created, written, or read.
    #[error("artifact error at '{}': {action}", .path.display())]
    #[diagnostic(code(frontdiff::artifact))]
    Artifact {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: io::Error,
    },

    /// A started stage could not be waited on.
    #[error("lost track of stage process '{program}'")]
    #[diagnostic(code(frontdiff::process))]
    Process {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    #[diagnostic(code(frontdiff::config))]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl HarnessError {
    /// Builds a [`HarnessError::Config`] with no underlying cause.
    pub fn config(message: impl Into<String>) -> Self {
        HarnessError::Config {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn scratch(path: impl Into<PathBuf>, action: &'static str, source: io::Error) -> Self {
        HarnessError::Scratch {
            path: path.into(),
            action,
            source,
        }
    }

    pub(crate) fn artifact(
        path: impl Into<PathBuf>,
        action: &'static str,
        source: io::Error,
    ) -> Self {
        HarnessError::Artifact {
            path: path.into(),
            action,
            source,
        }
    }
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
