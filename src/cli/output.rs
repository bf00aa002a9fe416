//! Handles all user-facing output for the CLI.
//!
//! The console surface is deliberately small: a separator line per case,
//! followed by that case's diff. Logs go to stderr through `tracing`, never
//! through here.

use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use tracing::warn;

use crate::cli::args::ColorMode;
use crate::report::{separator_line, Comparison, LineStyle, ReportSink};

impl ColorMode {
    /// Resolves `auto` against whether stdout is a terminal.
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
        }
    }
}

/// ConsoleSink: writes the report to stdout, colored when enabled.
pub struct ConsoleSink {
    stdout: StandardStream,
}

impl ConsoleSink {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stdout: StandardStream::stdout(choice),
        }
    }

    fn line(&mut self, spec: Option<ColorSpec>, text: &str) -> io::Result<()> {
        write_line(&mut self.stdout, spec, text)
    }
}

impl ReportSink for ConsoleSink {
    fn separator(&mut self, case_name: &str) {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(Color::Yellow)).set_bold(true);
        if let Err(e) = self.line(Some(spec), &separator_line(case_name)) {
            warn!(case = case_name, error = %e, "failed to write case separator to stdout");
        }
    }

    fn comparison(&mut self, comparison: &Comparison) {
        let written = comparison
            .rendered_lines()
            .into_iter()
            .try_for_each(|(style, text)| self.line(style_spec(style), &text))
            .and_then(|()| self.stdout.flush());
        if let Err(e) = written {
            warn!(case = %comparison.case_name, error = %e, "failed to write diff to stdout");
        }
    }
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn write_line<W: WriteColor>(out: &mut W, spec: Option<ColorSpec>, text: &str) -> io::Result<()> {
    if let Some(spec) = spec {
        out.set_color(&spec)?;
    }
    write!(out, "{}", text)?;
    out.reset()?;
    writeln!(out)
}

fn style_spec(style: LineStyle) -> Option<ColorSpec> {
    let mut spec = ColorSpec::new();
    match style {
        LineStyle::FileHeader => spec.set_bold(true),
        LineStyle::HunkHeader => spec.set_fg(Some(Color::Cyan)),
        LineStyle::Removed => spec.set_fg(Some(Color::Red)),
        LineStyle::Added => spec.set_fg(Some(Color::Green)),
        LineStyle::Note => spec.set_dimmed(true),
        LineStyle::Context => return None,
    };
    Some(spec)
}
