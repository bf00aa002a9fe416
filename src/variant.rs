//! Variants, modes, and the stage commands bound to them.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use serde::{Deserialize, Serialize};

/// Which pipeline shape a run exercises. Fixed for the whole invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Mode {
    /// Run only the lexer stage.
    #[serde(rename = "lexer")]
    #[value(name = "lexer")]
    LexOnly,
    /// Pipe the lexer stage into the parser stage.
    #[serde(rename = "parser")]
    #[value(name = "parser")]
    LexThenParse,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::LexOnly => "lexer",
            Mode::LexThenParse => "parser",
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::LexThenParse
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two implementations under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Candidate,
    Reference,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Candidate, Variant::Reference];
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Candidate => f.write_str("candidate"),
            Variant::Reference => f.write_str("reference"),
        }
    }
}

/// An external analyzer invocation: a program and its leading arguments.
///
/// In YAML this is either a bare path (`src/lexer`) or a mapping with
/// `program` and `args`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "StageCommandRepr")]
pub struct StageCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StageCommandRepr {
    Path(PathBuf),
    Full {
        program: PathBuf,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl From<StageCommandRepr> for StageCommand {
    fn from(repr: StageCommandRepr) -> Self {
        match repr {
            StageCommandRepr::Path(program) => StageCommand::new(program),
            StageCommandRepr::Full { program, args } => StageCommand {
                program,
                args: args.into_iter().map(OsString::from).collect(),
            },
        }
    }
}

impl StageCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// A `Command` with the program and leading arguments filled in.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    pub fn display_program(&self) -> String {
        self.program.display().to_string()
    }
}

/// Executables and artifact label bound to one [`Variant`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VariantConfig {
    /// Short tag used in artifact filenames, e.g. `my` or `ref`.
    pub label: String,
    pub lexer: StageCommand,
    pub parser: StageCommand,
}

impl VariantConfig {
    pub fn new(
        label: impl Into<String>,
        lexer: impl Into<PathBuf>,
        parser: impl Into<PathBuf>,
    ) -> Self {
        Self {
            label: label.into(),
            lexer: StageCommand::new(lexer),
            parser: StageCommand::new(parser),
        }
    }

    pub fn default_candidate() -> Self {
        Self::new("my", "src/lexer", "src/parser")
    }

    pub fn default_reference() -> Self {
        Self::new("ref", "reference-binaries/lexer", "reference-binaries/parser")
    }
}
