//! Blob-level diff: line-by-line comparison of file contents.
//!
//! Uses the `similar` crate (Myers diff) and groups changes into hunks with
//! three lines of context, the way unified diffs present them.

use std::fmt::Write as _;

use similar::{ChangeTag, TextDiff};

const CONTEXT_LINES: usize = 3;

/// The result of diffing two blobs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlobDiff {
    pub hunks: Vec<DiffHunk>,
    /// Set when either side is not UTF-8 and the contents differ. Binary
    /// diffs carry no hunks.
    pub binary: bool,
}

impl BlobDiff {
    /// Returns `true` if the two blobs are identical.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty() && !self.binary
    }

    pub fn additions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Added(_)))
    }

    pub fn deletions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Removed(_)))
    }

    fn count(&self, pred: impl Fn(&DiffLine) -> bool) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| pred(l))
            .count()
    }

    /// Render in unified format with `---`/`+++` headers.
    ///
    /// An empty diff renders as an empty string.
    pub fn render_unified(&self, old_label: &str, new_label: &str) -> String {
        let mut out = String::new();
        if self.binary {
            let _ = writeln!(out, "Binary files {old_label} and {new_label} differ");
            return out;
        }
        if self.hunks.is_empty() {
            return out;
        }
        let _ = writeln!(out, "--- {old_label}");
        let _ = writeln!(out, "+++ {new_label}");
        for hunk in &self.hunks {
            let _ = writeln!(
                out,
                "@@ -{},{} +{},{} @@",
                hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
            );
            for line in &hunk.lines {
                let (sign, text) = match line {
                    DiffLine::Context(t) => (' ', t),
                    DiffLine::Added(t) => ('+', t),
                    DiffLine::Removed(t) => ('-', t),
                };
                let _ = writeln!(out, "{sign}{text}");
            }
        }
        out
    }
}

/// A contiguous region of changes.
///
/// Start lines are 1-based. A side with zero lines reports the line just
/// before the hunk, as unified diffs do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

/// A single line in a diff hunk, without its line terminator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Added(String),
    Removed(String),
}

/// Compute a line diff between two byte slices.
pub fn diff_blobs(old: &[u8], new: &[u8]) -> BlobDiff {
    if old == new {
        return BlobDiff::default();
    }
    let (Ok(old_text), Ok(new_text)) = (std::str::from_utf8(old), std::str::from_utf8(new)) else {
        return BlobDiff {
            hunks: Vec::new(),
            binary: true,
        };
    };

    let text_diff = TextDiff::from_lines(old_text, new_text);
    let mut hunks = Vec::new();
    for group in text_diff.grouped_ops(CONTEXT_LINES) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;

        let mut lines = Vec::new();
        for op in &group {
            for change in text_diff.iter_changes(op) {
                let text = change.value().trim_end_matches(['\n', '\r']).to_string();
                lines.push(match change.tag() {
                    ChangeTag::Equal => DiffLine::Context(text),
                    ChangeTag::Insert => DiffLine::Added(text),
                    ChangeTag::Delete => DiffLine::Removed(text),
                });
            }
        }

        hunks.push(DiffHunk {
            old_start: unified_start(old_range.start, old_range.len()),
            old_count: old_range.len(),
            new_start: unified_start(new_range.start, new_range.len()),
            new_count: new_range.len(),
            lines,
        });
    }
    BlobDiff {
        hunks,
        binary: false,
    }
}

fn unified_start(index: usize, count: usize) -> usize {
    if count == 0 {
        index
    } else {
        index + 1
    }
}
