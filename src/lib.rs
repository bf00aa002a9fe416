//! frontdiff: differential testing for compiler front ends.
//!
//! A candidate lexer/parser and a trusted reference are run over the same
//! source cases; their combined output is captured per case and variant, and
//! any divergence is printed as a unified diff under a per-case separator.

pub use crate::errors::{HarnessError, Result};

pub mod build;
pub mod capture;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod driver;
pub mod errors;
pub mod pipeline;
pub mod report;
pub mod variant;
