//! Differ/Reporter: compares the two artifacts of a case and prints the result.
//!
//! The diff is unified style and oriented from reference to candidate: a line
//! only the candidate produced is `+`, a line only the reference produced is
//! `-`. Identical artifacts print nothing after the case separator.

use std::collections::HashMap;
use std::path::Path;

use difference::{Changeset, Difference};

use crate::capture::read_artifact;
use crate::errors::Result;
use crate::pipeline::CaseArtifacts;

/// Above this many cells (`old lines × new lines` after trimming the common
/// prefix and suffix) the changed region is reported as a block replacement
/// instead of running the quadratic line diff.
pub const MAX_DIFF_CELLS: usize = 4_000_000;

// =============================================================================
// CORE TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Removed,
    Added,
}

impl LineKind {
    fn prefix(self) -> char {
        match self {
            LineKind::Context => ' ',
            LineKind::Removed => '-',
            LineKind::Added => '+',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub text: String,
    /// Last line of its artifact and not newline-terminated.
    pub missing_newline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    pub fn header(&self) -> String {
        format!(
            "@@ -{} +{} @@",
            range(self.old_start, self.old_len),
            range(self.new_start, self.new_len)
        )
    }
}

fn range(start: usize, len: usize) -> String {
    if len == 1 {
        start.to_string()
    } else {
        format!("{},{}", start, len)
    }
}

/// Styling role of one rendered output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    FileHeader,
    HunkHeader,
    Context,
    Removed,
    Added,
    Note,
}

/// The result of comparing one case's artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub case_name: String,
    /// Shown on the `---` line.
    pub reference_label: String,
    /// Shown on the `+++` line.
    pub candidate_label: String,
    pub hunks: Vec<Hunk>,
}

impl Comparison {
    pub fn is_match(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Output lines with their styling role; empty when the artifacts match.
    pub fn rendered_lines(&self) -> Vec<(LineStyle, String)> {
        let mut out = Vec::new();
        if self.is_match() {
            return out;
        }
        out.push((LineStyle::FileHeader, format!("--- {}", self.reference_label)));
        out.push((LineStyle::FileHeader, format!("+++ {}", self.candidate_label)));
        for hunk in &self.hunks {
            out.push((LineStyle::HunkHeader, hunk.header()));
            for line in &hunk.lines {
                let style = match line.kind {
                    LineKind::Context => LineStyle::Context,
                    LineKind::Removed => LineStyle::Removed,
                    LineKind::Added => LineStyle::Added,
                };
                out.push((style, format!("{}{}", line.kind.prefix(), line.text)));
                if line.missing_newline {
                    out.push((LineStyle::Note, "\\ No newline at end of file".to_string()));
                }
            }
        }
        out
    }

    /// Plain-text rendering, one `\n`-terminated line per entry.
    pub fn render(&self) -> String {
        self.rendered_lines()
            .into_iter()
            .map(|(_, line)| line + "\n")
            .collect()
    }
}

// =============================================================================
// SINKS
// =============================================================================

/// Destination for per-case report output.
pub trait ReportSink {
    /// Marks the start of a case's report.
    fn separator(&mut self, case_name: &str);
    fn comparison(&mut self, comparison: &Comparison);
}

/// Separator line printed before each case.
pub fn separator_line(case_name: &str) -> String {
    format!("-----{}-----", case_name)
}

/// Collects report text in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub buffer: String,
    pub comparisons: Vec<Comparison>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl ReportSink for BufferSink {
    fn separator(&mut self, case_name: &str) {
        self.buffer.push_str(&separator_line(case_name));
        self.buffer.push('\n');
    }

    fn comparison(&mut self, comparison: &Comparison) {
        self.buffer.push_str(&comparison.render());
        self.comparisons.push(comparison.clone());
    }
}

// =============================================================================
// COMPARISON
// =============================================================================

/// Reads both artifacts of a case and diffs them.
pub fn compare_artifacts(
    case_name: &str,
    artifacts: &CaseArtifacts,
    context: usize,
) -> Result<Comparison> {
    let reference = read_artifact(&artifacts.reference)?;
    let candidate = read_artifact(&artifacts.candidate)?;
    Ok(compare_bytes(
        case_name,
        &artifacts.reference,
        &reference,
        &artifacts.candidate,
        &candidate,
        context,
    ))
}

/// Diffs two in-memory artifacts.
///
/// Lines are compared as raw bytes; bytes that are not UTF-8 are replaced
/// only when the differing lines are rendered.
pub fn compare_bytes(
    case_name: &str,
    reference_path: &Path,
    reference: &[u8],
    candidate_path: &Path,
    candidate: &[u8],
    context: usize,
) -> Comparison {
    let hunks = if reference == candidate {
        Vec::new()
    } else {
        diff_bytes(reference, candidate, context)
    };
    Comparison {
        case_name: case_name.to_string(),
        reference_label: reference_path.display().to_string(),
        candidate_label: candidate_path.display().to_string(),
        hunks,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Line<'a> {
    bytes: &'a [u8],
    terminated: bool,
}

fn split_lines(data: &[u8]) -> Vec<Line<'_>> {
    data.split_inclusive(|&b| b == b'\n')
        .map(|raw| match raw.strip_suffix(b"\n") {
            Some(bytes) => Line {
                bytes,
                terminated: true,
            },
            None => Line {
                bytes: raw,
                terminated: false,
            },
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op<'a> {
    Equal(Line<'a>),
    Delete(Line<'a>),
    Insert(Line<'a>),
}

/// Line diff of `old` → `new` grouped into hunks with `context` lines around changes.
pub fn diff_text(old: &str, new: &str, context: usize) -> Vec<Hunk> {
    diff_bytes(old.as_bytes(), new.as_bytes(), context)
}

/// Byte-wise [`diff_text`]: two lines are equal only if their bytes are.
pub fn diff_bytes(old: &[u8], new: &[u8], context: usize) -> Vec<Hunk> {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let ops = diff_lines(&old_lines, &new_lines);
    build_hunks(&ops, context)
}

fn diff_lines<'a>(old: &[Line<'a>], new: &[Line<'a>]) -> Vec<Op<'a>> {
    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];

    let mut ops: Vec<Op<'a>> = old[..prefix].iter().copied().map(Op::Equal).collect();
    if old_mid.is_empty() || new_mid.is_empty() || old_mid.len() * new_mid.len() > MAX_DIFF_CELLS {
        ops.extend(old_mid.iter().copied().map(Op::Delete));
        ops.extend(new_mid.iter().copied().map(Op::Insert));
    } else {
        ops.extend(changeset_ops(old_mid, new_mid));
    }
    ops.extend(old[old.len() - suffix..].iter().copied().map(Op::Equal));
    ops
}

/// Runs `difference` over the changed region.
///
/// Each distinct line (bytes plus trailing-newline flag) is replaced by a
/// numeric token shared by both sides, so the text handed to `Changeset` has
/// no empty lines and equal tokens mean byte-equal lines.
fn changeset_ops<'a>(old: &[Line<'a>], new: &[Line<'a>]) -> Vec<Op<'a>> {
    let mut tokens = HashMap::new();
    let old_text = encode_lines(old, &mut tokens);
    let new_text = encode_lines(new, &mut tokens);
    let changeset = Changeset::new(&old_text, &new_text, "\n");

    let mut old_iter = old.iter().copied();
    let mut new_iter = new.iter().copied();
    let mut ops = Vec::with_capacity(old.len() + new.len());
    for diff in &changeset.diffs {
        let (chunk, kind) = match diff {
            Difference::Same(chunk) => (chunk, LineKind::Context),
            Difference::Rem(chunk) => (chunk, LineKind::Removed),
            Difference::Add(chunk) => (chunk, LineKind::Added),
        };
        for _ in chunk.split('\n') {
            let op = match kind {
                LineKind::Context => {
                    new_iter.next();
                    old_iter.next().map(Op::Equal)
                }
                LineKind::Removed => old_iter.next().map(Op::Delete),
                LineKind::Added => new_iter.next().map(Op::Insert),
            };
            ops.extend(op);
        }
    }
    ops
}

fn encode_lines<'a>(lines: &[Line<'a>], tokens: &mut HashMap<Line<'a>, usize>) -> String {
    lines
        .iter()
        .map(|line| {
            let next = tokens.len();
            tokens.entry(*line).or_insert(next).to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_hunks(ops: &[Op<'_>], context: usize) -> Vec<Hunk> {
    let changes: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| !matches!(op, Op::Equal(_)))
        .map(|(i, _)| i)
        .collect();
    let Some(&first) = changes.first() else {
        return Vec::new();
    };

    // Lines of each side consumed before op `i`.
    let mut old_before = Vec::with_capacity(ops.len() + 1);
    let mut new_before = Vec::with_capacity(ops.len() + 1);
    let (mut o, mut n) = (0usize, 0usize);
    for op in ops {
        old_before.push(o);
        new_before.push(n);
        match op {
            Op::Equal(_) => {
                o += 1;
                n += 1;
            }
            Op::Delete(_) => o += 1,
            Op::Insert(_) => n += 1,
        }
    }
    old_before.push(o);
    new_before.push(n);

    let mut groups = Vec::new();
    let mut group_first = first;
    let mut group_last = first;
    for &idx in &changes[1..] {
        if idx - group_last - 1 <= 2 * context {
            group_last = idx;
        } else {
            groups.push((group_first, group_last));
            group_first = idx;
            group_last = idx;
        }
    }
    groups.push((group_first, group_last));

    groups
        .into_iter()
        .map(|(first, last)| {
            let start = first.saturating_sub(context);
            let end = (last + context + 1).min(ops.len());
            let old_len = old_before[end] - old_before[start];
            let new_len = new_before[end] - new_before[start];
            let lines = ops[start..end]
                .iter()
                .map(|op| {
                    let (kind, line) = match op {
                        Op::Equal(line) => (LineKind::Context, line),
                        Op::Delete(line) => (LineKind::Removed, line),
                        Op::Insert(line) => (LineKind::Added, line),
                    };
                    DiffLine {
                        kind,
                        text: String::from_utf8_lossy(line.bytes).into_owned(),
                        missing_newline: !line.terminated,
                    }
                })
                .collect();
            Hunk {
                old_start: hunk_start(old_before[start], old_len),
                old_len,
                new_start: hunk_start(new_before[start], new_len),
                new_len,
                lines,
            }
        })
        .collect()
}

/// Unified diffs number an empty range by the line before it.
fn hunk_start(before: usize, len: usize) -> usize {
    if len == 0 {
        before
    } else {
        before + 1
    }
}
