//! Harness configuration.
//!
//! Defaults describe the conventional project layout: candidate binaries under
//! `src/`, known-good binaries under `reference-binaries/`, cases under
//! `cases/` plus `<mode>_cases/`, artifacts under `temp/`. A YAML file may
//! override any of it, and command-line flags override the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{HarnessError, Result};
use crate::variant::{Mode, StageCommand, Variant, VariantConfig};

/// File picked up automatically when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "frontdiff.yaml";

/// The external build step run before any case.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory for the build, relative to where the harness runs.
    #[serde(default = "BuildConfig::default_dir")]
    pub dir: PathBuf,
}

impl BuildConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("src")
    }

    pub fn command(&self) -> StageCommand {
        StageCommand::new(&self.program).with_args(&self.args)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("make"),
            args: Vec::new(),
            dir: Self::default_dir(),
        }
    }
}

/// Where test cases are found.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Cases run in every mode.
    pub general: PathBuf,
    /// Cases run only in lexer mode.
    pub lexer: PathBuf,
    /// Cases run only in parser mode.
    pub parser: PathBuf,
    /// Source-file extension without the dot.
    pub extension: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            general: PathBuf::from("cases"),
            lexer: PathBuf::from("lexer_cases"),
            parser: PathBuf::from("parser_cases"),
            extension: "cl".to_string(),
        }
    }
}

impl CorpusConfig {
    /// Case directories for `mode`: the mode-specific one first, then the general one.
    pub fn sources(&self, mode: Mode) -> [&Path; 2] {
        let specific = match mode {
            Mode::LexOnly => &self.lexer,
            Mode::LexThenParse => &self.parser,
        };
        [specific.as_path(), self.general.as_path()]
    }
}

/// Everything one harness invocation needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub mode: Mode,
    pub scratch_dir: PathBuf,
    pub corpus: CorpusConfig,
    /// `None` skips the build step.
    pub build: Option<BuildConfig>,
    pub candidate: VariantConfig,
    pub reference: VariantConfig,
    /// Context lines around each change in the printed diff.
    pub context_lines: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            scratch_dir: PathBuf::from("temp"),
            corpus: CorpusConfig::default(),
            build: Some(BuildConfig::default()),
            candidate: VariantConfig::default_candidate(),
            reference: VariantConfig::default_reference(),
            context_lines: 3,
        }
    }
}

impl HarnessConfig {
    pub fn variant(&self, variant: Variant) -> &VariantConfig {
        match variant {
            Variant::Candidate => &self.candidate,
            Variant::Reference => &self.reference,
        }
    }

    /// Rejects configurations whose artifact paths could collide.
    ///
    /// Artifact names are `{case}_{label}.out`; with labels free of `_`, `.`
    /// and path separators, the label is always the final `_` segment, so
    /// distinct (case, label) pairs can never map to the same file.
    pub fn validate(&self) -> Result<()> {
        for variant in Variant::ALL {
            let label = &self.variant(variant).label;
            if label.is_empty() {
                return Err(HarnessError::config(format!(
                    "{} label must not be empty",
                    variant
                )));
            }
            if label.contains(['_', '.', '/', '\\']) {
                return Err(HarnessError::config(format!(
                    "{} label '{}' must not contain '_', '.', '/' or '\\'",
                    variant, label
                )));
            }
        }
        if self.candidate.label == self.reference.label {
            return Err(HarnessError::config(format!(
                "candidate and reference share the label '{}'",
                self.candidate.label
            )));
        }
        if self.corpus.extension.is_empty() {
            return Err(HarnessError::config("corpus extension must not be empty"));
        }
        Ok(())
    }
}

/// Loads a YAML configuration file; absent keys keep their defaults.
pub fn load_config(path: &Path) -> Result<HarnessConfig> {
    let content = fs::read_to_string(path).map_err(|e| HarnessError::Config {
        message: format!("failed to read {}", path.display()),
        source: Some(Box::new(e)),
    })?;
    parse_config(&content).map_err(|e| match e {
        HarnessError::Config { message, source } => HarnessError::Config {
            message: format!("{} ({})", message, path.display()),
            source,
        },
        other => other,
    })
}

/// Parses YAML configuration text.
pub fn parse_config(content: &str) -> Result<HarnessConfig> {
    if content.trim().is_empty() {
        return Ok(HarnessConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| HarnessError::Config {
        message: "invalid YAML configuration".to_string(),
        source: Some(Box::new(e)),
    })
}
