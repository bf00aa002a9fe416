//! Harness driver.
//!
//! One invocation walks a fixed sequence of phases:
//! 1. **Build**: run the external build step for the candidate (fatal on failure)
//! 2. **Clean**: create the scratch directory and empty it
//! 3. **Enumerate**: collect mode-specific cases, then general cases
//! 4. **Run + Diff**: for each case in order, run both variants, then compare
//!    and report before moving to the next case
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use frontdiff::config::HarnessConfig;
//! use frontdiff::driver::{Harness, RunOptions};
//! use frontdiff::report::BufferSink;
//!
//! let harness = Harness::new(HarnessConfig::default()).unwrap();
//! let mut sink = BufferSink::new();
//! let summary = harness.run(&mut sink, &RunOptions::default()).unwrap();
//! println!("{} of {} cases diverged", summary.diverged.len(), summary.cases);
//! ```

use tracing::{debug, info};

use crate::build::run_build;
use crate::capture::prepare_scratch;
use crate::config::HarnessConfig;
use crate::corpus::{discover, TestCase};
use crate::errors::Result;
use crate::pipeline::run_case;
use crate::report::{compare_artifacts, Comparison, ReportSink};

/// Per-invocation switches that are not part of the configuration proper.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub skip_build: bool,
    /// Only cases whose name contains this substring are run.
    pub filter: Option<String>,
}

/// What a completed run saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cases: usize,
    /// Names of cases whose artifacts differed, in run order.
    pub diverged: Vec<String>,
}

impl RunSummary {
    pub fn all_matched(&self) -> bool {
        self.diverged.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs every phase once, reporting each case to `sink` as it finishes.
    pub fn run(&self, sink: &mut dyn ReportSink, options: &RunOptions) -> Result<RunSummary> {
        match (&self.config.build, options.skip_build) {
            (Some(build), false) => run_build(build)?,
            _ => debug!("build step skipped"),
        }

        prepare_scratch(&self.config.scratch_dir)?;

        let cases = self.cases(options.filter.as_deref());
        info!(mode = %self.config.mode, cases = cases.len(), "running cases");

        let mut summary = RunSummary::default();
        for case in &cases {
            let comparison = self.run_one(case, sink)?;
            summary.cases += 1;
            if !comparison.is_match() {
                summary.diverged.push(case.name.clone());
            }
        }

        info!(
            cases = summary.cases,
            diverged = summary.diverged.len(),
            "run complete"
        );
        Ok(summary)
    }

    /// Mode-specific cases followed by general cases, optionally filtered by name.
    pub fn cases(&self, filter: Option<&str>) -> Vec<TestCase> {
        let corpus = &self.config.corpus;
        let mut cases = discover(corpus.sources(self.config.mode), &corpus.extension);
        if let Some(filter) = filter {
            cases.retain(|case| case.name.contains(filter));
        }
        cases
    }

    /// Runs both variants on one case, then compares and reports it.
    ///
    /// Both artifacts are rewritten before the comparison reads them, so a
    /// case never sees output left by an earlier case of the same name.
    pub fn run_one(&self, case: &TestCase, sink: &mut dyn ReportSink) -> Result<Comparison> {
        let artifacts = run_case(
            case,
            self.config.mode,
            &self.config.candidate,
            &self.config.reference,
            &self.config.scratch_dir,
        )?;
        let comparison = compare_artifacts(&case.name, &artifacts, self.config.context_lines)?;
        sink.separator(&case.name);
        sink.comparison(&comparison);
        Ok(comparison)
    }
}
