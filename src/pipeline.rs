//! Runs the analyzer stages of each variant against a case.
//!
//! Every (case, variant) pair gets its own processes, its own pipe and its own
//! artifact file, so the two variants cannot see each other's output.
//!
//! Stage failures are data: a non-zero exit, a crash, or a program that cannot
//! be started leaves whatever text it produced (or a start message) in the
//! artifact, and the run carries on.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};

use tracing::{debug, info};

use crate::capture::{artifact_path, create_artifact};
use crate::corpus::TestCase;
use crate::errors::{HarnessError, Result};
use crate::variant::{Mode, StageCommand, Variant, VariantConfig};

/// How a single stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Exited(ExitStatus),
    /// The program could not be started; holds the OS error text.
    NotStarted(String),
}

impl StageStatus {
    pub fn success(&self) -> bool {
        matches!(self, StageStatus::Exited(status) if status.success())
    }
}

/// Exit information for one variant's pipeline. Informational only: it never
/// changes what gets compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub lexer: StageStatus,
    /// `None` in lexer-only mode.
    pub parser: Option<StageStatus>,
}

/// Artifacts produced for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseArtifacts {
    pub candidate: PathBuf,
    pub reference: PathBuf,
}

impl CaseArtifacts {
    pub fn get(&self, variant: Variant) -> &Path {
        match variant {
            Variant::Candidate => &self.candidate,
            Variant::Reference => &self.reference,
        }
    }
}

/// Runs both variants on `case`, writing one fresh artifact each.
pub fn run_case(
    case: &TestCase,
    mode: Mode,
    candidate: &VariantConfig,
    reference: &VariantConfig,
    scratch: &Path,
) -> Result<CaseArtifacts> {
    let artifacts = CaseArtifacts {
        candidate: artifact_path(scratch, &case.name, &candidate.label),
        reference: artifact_path(scratch, &case.name, &reference.label),
    };
    for (variant, config) in [(Variant::Candidate, candidate), (Variant::Reference, reference)] {
        let outcome = run_variant(case, mode, config, artifacts.get(variant))?;
        log_outcome(case, variant, &outcome);
    }
    Ok(artifacts)
}

/// Runs one variant's stage(s) on `case`, capturing into `artifact`.
///
/// The artifact is truncated before anything runs.
pub fn run_variant(
    case: &TestCase,
    mode: Mode,
    variant: &VariantConfig,
    artifact: &Path,
) -> Result<PipelineOutcome> {
    let sink = create_artifact(artifact)?;
    match mode {
        Mode::LexOnly => run_lexer_only(case, variant, &sink, artifact),
        Mode::LexThenParse => run_lexer_then_parser(case, variant, &sink, artifact),
    }
}

// =============================================================================
// PIPELINE SHAPES
// =============================================================================

/// `lexer <case> > artifact 2>&1`
fn run_lexer_only(
    case: &TestCase,
    variant: &VariantConfig,
    sink: &File,
    artifact: &Path,
) -> Result<PipelineOutcome> {
    let spawned = {
        let mut cmd = variant.lexer.command();
        cmd.arg(&case.path)
            .stdin(Stdio::null())
            .stdout(capture_stdio(sink, artifact)?)
            .stderr(capture_stdio(sink, artifact)?);
        cmd.spawn()
    };
    let lexer = match spawned {
        Ok(child) => StageStatus::Exited(wait(child, &variant.lexer)?),
        Err(e) => record_start_failure(sink, artifact, &variant.lexer, e)?,
    };
    Ok(PipelineOutcome {
        lexer,
        parser: None,
    })
}

/// `lexer <case> | parser > artifact 2>&1`
///
/// The lexer's stderr is left attached to the harness, as it would be under a
/// shell; only the parser's streams are captured.
fn run_lexer_then_parser(
    case: &TestCase,
    variant: &VariantConfig,
    sink: &File,
    artifact: &Path,
) -> Result<PipelineOutcome> {
    let lexer_spawn = {
        let mut cmd = variant.lexer.command();
        cmd.arg(&case.path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        cmd.spawn()
    };

    let (lexer_handle, parser_input) = match lexer_spawn {
        Ok(mut child) => {
            let input = child
                .stdout
                .take()
                .map(Stdio::from)
                .unwrap_or_else(Stdio::null);
            (LexerHandle::Running(child), input)
        }
        Err(e) => {
            let status = record_start_failure(sink, artifact, &variant.lexer, e)?;
            (LexerHandle::NotStarted(status), Stdio::null())
        }
    };

    // The command owns the pipe's read end; it has to be dropped right after
    // spawning or the lexer never sees a closed pipe if the parser quits early.
    let parser_spawn = {
        let mut cmd = variant.parser.command();
        cmd.stdin(parser_input)
            .stdout(capture_stdio(sink, artifact)?)
            .stderr(capture_stdio(sink, artifact)?);
        cmd.spawn()
    };

    let parser = match parser_spawn {
        Ok(child) => StageStatus::Exited(wait(child, &variant.parser)?),
        Err(e) => record_start_failure(sink, artifact, &variant.parser, e)?,
    };

    let lexer = match lexer_handle {
        LexerHandle::Running(child) => StageStatus::Exited(wait(child, &variant.lexer)?),
        LexerHandle::NotStarted(status) => status,
    };

    Ok(PipelineOutcome {
        lexer,
        parser: Some(parser),
    })
}

// =============================================================================
// HELPERS
// =============================================================================

enum LexerHandle {
    Running(Child),
    NotStarted(StageStatus),
}

/// A second handle on the artifact so stdout and stderr interleave into one file.
fn capture_stdio(sink: &File, artifact: &Path) -> Result<Stdio> {
    sink.try_clone()
        .map(Stdio::from)
        .map_err(|e| HarnessError::artifact(artifact, "duplicate handle", e))
}

fn wait(mut child: Child, stage: &StageCommand) -> Result<ExitStatus> {
    child.wait().map_err(|source| HarnessError::Process {
        program: stage.display_program(),
        source,
    })
}

/// Writes the message a shell would print for an unstartable program into the
/// artifact, so the failure is compared like any other output.
fn record_start_failure(
    mut sink: &File,
    artifact: &Path,
    stage: &StageCommand,
    error: io::Error,
) -> Result<StageStatus> {
    let message = start_failure_message(stage, &error);
    writeln!(sink, "{}", message).map_err(|e| HarnessError::artifact(artifact, "write", e))?;
    Ok(StageStatus::NotStarted(error.to_string()))
}

pub(crate) fn start_failure_message(stage: &StageCommand, error: &io::Error) -> String {
    format!(
        "frontdiff: failed to start '{}': {}",
        stage.display_program(),
        error
    )
}

fn log_outcome(case: &TestCase, variant: Variant, outcome: &PipelineOutcome) {
    let stages = std::iter::once(("lexer", &outcome.lexer))
        .chain(outcome.parser.as_ref().map(|status| ("parser", status)));
    for (stage, status) in stages {
        match status {
            StageStatus::Exited(exit) if exit.success() => {
                debug!(case = %case.name, %variant, stage, "stage succeeded");
            }
            StageStatus::Exited(exit) => {
                info!(case = %case.name, %variant, stage, status = %exit, "stage exited unsuccessfully");
            }
            StageStatus::NotStarted(error) => {
                info!(case = %case.name, %variant, stage, %error, "stage could not be started");
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    fn sh(script: &str) -> StageCommand {
        StageCommand::new("/bin/sh").with_args(["-c", script, "stage"])
    }

    fn case_in(dir: &Path, name: &str, content: &str) -> TestCase {
        let path = dir.join(format!("{}.cl", name));
        fs::write(&path, content).unwrap();
        TestCase::from_path(path).unwrap()
    }

    #[test]
    fn lexer_only_captures_stdout_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let case = case_in(dir.path(), "foo", "class Main {};\n");
        let variant = VariantConfig {
            label: "my".to_string(),
            lexer: sh("cat \"$1\"; echo oops >&2"),
            parser: StageCommand::new("/bin/false"),
        };
        let artifact = dir.path().join("foo_my.out");

        let outcome = run_variant(&case, Mode::LexOnly, &variant, &artifact).unwrap();
        assert!(outcome.lexer.success());
        assert_eq!(outcome.parser, None);
        assert_eq!(fs::read_to_string(&artifact).unwrap(), "class Main {};\noops\n");
    }

    #[test]
    fn parser_reads_exactly_what_lexer_wrote() {
        let dir = tempfile::tempdir().unwrap();
        let case = case_in(dir.path(), "big", "");
        let variant = VariantConfig {
            label: "my".to_string(),
            lexer: sh("i=0; while [ $i -lt 20000 ]; do echo \"#$i OBJECTID tok$i\"; i=$((i+1)); done"),
            parser: sh("sleep 0.2; cat"),
        };
        let artifact = dir.path().join("big_my.out");

        let outcome = run_variant(&case, Mode::LexThenParse, &variant, &artifact).unwrap();
        assert!(outcome.lexer.success());
        assert_eq!(outcome.parser.as_ref().map(StageStatus::success), Some(true));

        let captured = fs::read_to_string(&artifact).unwrap();
        let expected: String = (0..20000)
            .map(|i| format!("#{} OBJECTID tok{}\n", i, i))
            .collect();
        assert_eq!(captured, expected);
    }

    #[test]
    fn non_zero_exit_is_captured_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let case = case_in(dir.path(), "bad", "");
        let variant = VariantConfig {
            label: "my".to_string(),
            lexer: sh("echo partial; exit 3"),
            parser: sh("cat; echo 'syntax error' >&2; exit 1"),
        };
        let artifact = dir.path().join("bad_my.out");

        let outcome = run_variant(&case, Mode::LexThenParse, &variant, &artifact).unwrap();
        assert!(!outcome.lexer.success());
        assert!(!outcome.parser.unwrap().success());
        assert_eq!(fs::read_to_string(&artifact).unwrap(), "partial\nsyntax error\n");
    }

    #[test]
    fn missing_lexer_writes_start_message() {
        let dir = tempfile::tempdir().unwrap();
        let case = case_in(dir.path(), "foo", "");
        let variant = VariantConfig::new(
            "ref",
            dir.path().join("no-such-lexer"),
            dir.path().join("no-such-parser"),
        );
        let artifact = dir.path().join("foo_ref.out");

        let outcome = run_variant(&case, Mode::LexOnly, &variant, &artifact).unwrap();
        assert!(matches!(outcome.lexer, StageStatus::NotStarted(_)));
        let text = fs::read_to_string(&artifact).unwrap();
        assert!(text.starts_with("frontdiff: failed to start '"));
        assert!(text.contains("no-such-lexer"));
    }

    #[test]
    fn missing_lexer_still_runs_parser_on_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let case = case_in(dir.path(), "foo", "");
        let variant = VariantConfig {
            label: "ref".to_string(),
            lexer: StageCommand::new(dir.path().join("no-such-lexer")),
            parser: sh("printf 'bytes:'; wc -c | tr -d ' '"),
        };
        let artifact = dir.path().join("foo_ref.out");

        let outcome = run_variant(&case, Mode::LexThenParse, &variant, &artifact).unwrap();
        assert!(matches!(outcome.lexer, StageStatus::NotStarted(_)));
        let text = fs::read_to_string(&artifact).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().contains("no-such-lexer"));
        assert_eq!(lines.next(), Some("bytes:0"));
    }

    #[test]
    fn parser_quitting_early_does_not_hang() {
        let dir = tempfile::tempdir().unwrap();
        let case = case_in(dir.path(), "early", "");
        let variant = VariantConfig {
            label: "my".to_string(),
            lexer: sh("yes token"),
            parser: sh("head -n 2"),
        };
        let artifact = dir.path().join("early_my.out");

        run_variant(&case, Mode::LexThenParse, &variant, &artifact).unwrap();
        assert_eq!(fs::read_to_string(&artifact).unwrap(), "token\ntoken\n");
    }

    #[test]
    fn run_case_keeps_variants_apart() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("temp");
        fs::create_dir(&scratch).unwrap();
        let case = case_in(dir.path(), "foo", "x\n");
        let candidate = VariantConfig {
            label: "my".to_string(),
            lexer: sh("echo candidate"),
            parser: sh("cat"),
        };
        let reference = VariantConfig {
            label: "ref".to_string(),
            lexer: sh("echo reference"),
            parser: sh("cat"),
        };

        let artifacts =
            run_case(&case, Mode::LexThenParse, &candidate, &reference, &scratch).unwrap();
        assert_eq!(artifacts.candidate, scratch.join("foo_my.out"));
        assert_eq!(artifacts.reference, scratch.join("foo_ref.out"));
        assert_eq!(fs::read_to_string(&artifacts.candidate).unwrap(), "candidate\n");
        assert_eq!(fs::read_to_string(&artifacts.reference).unwrap(), "reference\n");
    }

    #[test]
    fn rerun_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let case = case_in(dir.path(), "foo", "a\nb\n");
        let variant = VariantConfig {
            label: "my".to_string(),
            lexer: sh("cat \"$1\"; echo done >&2"),
            parser: sh("cat"),
        };
        let artifact = dir.path().join("foo_my.out");

        run_variant(&case, Mode::LexOnly, &variant, &artifact).unwrap();
        let first = fs::read(&artifact).unwrap();
        run_variant(&case, Mode::LexOnly, &variant, &artifact).unwrap();
        assert_eq!(fs::read(&artifact).unwrap(), first);
    }
}
