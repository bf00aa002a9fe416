//! Defines the command-line arguments for the frontdiff CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure. Every flag is
//! optional and overrides the corresponding configuration value.

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

use crate::variant::Mode;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "frontdiff",
    version,
    about = "Runs a candidate and a reference compiler front end over the same cases and diffs their output."
)]
pub struct FrontdiffArgs {
    /// YAML configuration file (defaults to ./frontdiff.yaml when present).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Pipeline to exercise: the lexer alone, or the lexer piped into the parser.
    #[arg(short, long, value_enum)]
    pub mode: Option<Mode>,

    /// Directory for captured output; emptied at the start of every run.
    #[arg(long)]
    pub scratch: Option<PathBuf>,

    /// Do not run the build step before testing.
    #[arg(long)]
    pub skip_build: bool,

    /// Lines of context around each change.
    #[arg(long)]
    pub context: Option<usize>,

    /// Only run cases whose name contains this substring.
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Exit with status 1 when any case diverged.
    #[arg(long)]
    pub fail_on_diff: bool,

    /// When to color the report.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Log more on stderr (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}
