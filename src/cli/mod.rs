//! The frontdiff command-line interface.
//!
//! This module is the main entry point for the binary: it parses arguments,
//! layers them over the configuration file, sets up logging, and drives the
//! harness with a console sink.

use crate::cli::args::FrontdiffArgs;
use crate::cli::output::ConsoleSink;
use crate::config::{load_config, HarnessConfig, DEFAULT_CONFIG_FILE};
use crate::driver::{Harness, RunOptions, RunSummary};
use crate::errors::Result;
use clap::Parser;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

pub mod args;
pub mod output;

/// Exit status when at least one case diverged and `--fail-on-diff` is set.
pub const EXIT_DIVERGED: i32 = 1;
/// Exit status when the harness itself failed.
pub const EXIT_HARNESS_ERROR: i32 = 2;

/// The main entry point for the CLI.
pub fn run() {
    let args = FrontdiffArgs::parse();
    init_logging(args.verbose);

    match execute(&args) {
        Ok(summary) => {
            if args.fail_on_diff && !summary.all_matched() {
                process::exit(EXIT_DIVERGED);
            }
        }
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(EXIT_HARNESS_ERROR);
        }
    }
}

/// Resolves configuration and runs the harness, reporting to stdout.
pub fn execute(args: &FrontdiffArgs) -> Result<RunSummary> {
    let config = resolve_config(args)?;
    let harness = Harness::new(config)?;
    let mut sink = ConsoleSink::new(args.color.choice());
    let options = RunOptions {
        skip_build: args.skip_build,
        filter: args.filter.clone(),
    };
    harness.run(&mut sink, &options)
}

/// Defaults, then the configuration file, then command-line overrides.
pub fn resolve_config(args: &FrontdiffArgs) -> Result<HarnessConfig> {
    let default_file = Path::new(DEFAULT_CONFIG_FILE);
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None if default_file.is_file() => load_config(default_file)?,
        None => HarnessConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(scratch) = &args.scratch {
        config.scratch_dir = scratch.clone();
    }
    if let Some(context) = args.context {
        config.context_lines = context;
    }
    Ok(config)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
