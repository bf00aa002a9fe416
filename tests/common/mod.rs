//! Shared fixtures: a throwaway project root with case directories and
//! `/bin/sh` one-liners standing in for the lexer and parser binaries.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use frontdiff::config::HarnessConfig;
use frontdiff::variant::{Mode, StageCommand, VariantConfig};
use tempfile::TempDir;

/// Echoes the case file the way a lexer would print tokens.
pub const CAT_LEXER: &str = "cat \"$1\"";
/// Passes its input straight through.
pub const CAT_PARSER: &str = "cat";

pub struct Project {
    pub root: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn scratch(&self) -> PathBuf {
        self.path().join("temp")
    }

    /// Writes `<dir>/<name>.cl` under the project root.
    pub fn case(&self, dir: &str, name: &str, content: &str) -> PathBuf {
        let dir = self.path().join(dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{}.cl", name));
        fs::write(&path, content).unwrap();
        path
    }

    /// Config rooted in this project with the build step disabled.
    pub fn config(
        &self,
        mode: Mode,
        candidate: VariantConfig,
        reference: VariantConfig,
    ) -> HarnessConfig {
        let mut config = HarnessConfig::default();
        config.mode = mode;
        config.scratch_dir = self.scratch();
        config.corpus.general = self.path().join("cases");
        config.corpus.lexer = self.path().join("lexer_cases");
        config.corpus.parser = self.path().join("parser_cases");
        config.build = None;
        config.candidate = candidate;
        config.reference = reference;
        config
    }

    /// Sorted file names currently in the scratch directory.
    pub fn artifacts(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.scratch())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn sh(script: &str) -> StageCommand {
    StageCommand::new("/bin/sh").with_args(["-c", script, "stage"])
}

pub fn variant(label: &str, lexer: &str, parser: &str) -> VariantConfig {
    VariantConfig {
        label: label.to_string(),
        lexer: sh(lexer),
        parser: sh(parser),
    }
}

/// Lines of a rendered diff that carry the given change prefix, excluding the
/// `---`/`+++` file headers.
pub fn changed_lines(rendered: &str, prefix: char) -> Vec<String> {
    rendered
        .lines()
        .filter(|l| l.starts_with(prefix) && !l.starts_with("+++") && !l.starts_with("---"))
        .map(str::to_string)
        .collect()
}
