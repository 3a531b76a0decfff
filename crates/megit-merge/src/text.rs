//! Line-based three-way content merge.
//!
//! Both sides are diffed against the base with `similar`. Edits whose base
//! ranges overlap or touch form one region: if only one side edited it, that
//! side wins; if both did and produced the same lines, those lines are kept;
//! otherwise the region is emitted between conflict markers.

use std::fmt::Write as _;
use std::ops::Range;

use similar::{capture_diff_slices, Algorithm, DiffTag};

pub const MARKER_START: &str = "<<<<<<<";
pub const MARKER_SEPARATOR: &str = "=======";
pub const MARKER_END: &str = ">>>>>>>";

/// Labels written after the opening and closing conflict markers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictLabels {
    pub ours: String,
    pub theirs: String,
}

impl ConflictLabels {
    pub fn new(ours: impl Into<String>, theirs: impl Into<String>) -> Self {
        Self {
            ours: ours.into(),
            theirs: theirs.into(),
        }
    }
}

impl Default for ConflictLabels {
    fn default() -> Self {
        Self::new("HEAD", "MERGE_HEAD")
    }
}

/// Result of a content merge. Conflicts are embedded in `content`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMerge {
    pub content: String,
    /// Number of regions framed by conflict markers.
    pub conflicts: usize,
}

impl TextMerge {
    pub fn is_clean(&self) -> bool {
        self.conflicts == 0
    }
}

/// One side's replacement of base lines `base` by side lines `side`.
#[derive(Clone, Debug)]
struct Edit {
    base: Range<usize>,
    side: Range<usize>,
}

fn edits(base: &[&str], side: &[&str]) -> Vec<Edit> {
    let mut out: Vec<Edit> = Vec::new();
    for op in capture_diff_slices(Algorithm::Myers, base, side) {
        let (tag, old, new) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.base.end == old.start && last.side.end == new.start => {
                last.base.end = old.end;
                last.side.end = new.end;
            }
            _ => out.push(Edit {
                base: old,
                side: new,
            }),
        }
    }
    out
}

/// The lines one side holds for the base region `region`, given that side's
/// edits falling inside it. A side without edits there holds the base lines.
fn region_lines<'s, 'a>(
    span: &[Edit],
    side: &'s [&'a str],
    base: &'s [&'a str],
    region: &Range<usize>,
) -> &'s [&'a str] {
    match (span.first(), span.last()) {
        (Some(first), Some(last)) => {
            let start = first.side.start - (first.base.start - region.start);
            let end = last.side.end + (region.end - last.base.end);
            &side[start..end]
        }
        _ => &base[region.clone()],
    }
}

fn push_lines(out: &mut String, lines: &[&str]) {
    for line in lines {
        out.push_str(line);
    }
}

fn push_conflict(out: &mut String, ours: &[&str], theirs: &[&str], labels: &ConflictLabels) {
    let _ = writeln!(out, "{MARKER_START} {}", labels.ours);
    push_lines(out, ours);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    let _ = writeln!(out, "{MARKER_SEPARATOR}");
    push_lines(out, theirs);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    let _ = writeln!(out, "{MARKER_END} {}", labels.theirs);
}

/// Merge `ours` and `theirs`, both derived from `base`.
///
/// Line endings are preserved as found; a final line without a newline stays
/// that way unless it ends up inside a conflict region.
pub fn merge_text(base: &str, ours: &str, theirs: &str, labels: &ConflictLabels) -> TextMerge {
    let base_lines: Vec<&str> = base.split_inclusive('\n').collect();
    let ours_lines: Vec<&str> = ours.split_inclusive('\n').collect();
    let theirs_lines: Vec<&str> = theirs.split_inclusive('\n').collect();
    let ours_edits = edits(&base_lines, &ours_lines);
    let theirs_edits = edits(&base_lines, &theirs_lines);

    let mut content = String::with_capacity(ours.len().max(theirs.len()));
    let mut conflicts = 0;
    let mut pos = 0;
    let (mut i, mut j) = (0, 0);

    loop {
        let start = match (ours_edits.get(i), theirs_edits.get(j)) {
            (None, None) => break,
            (Some(o), None) => o.base.start,
            (None, Some(t)) => t.base.start,
            (Some(o), Some(t)) => o.base.start.min(t.base.start),
        };

        // Grow the region while either side has an edit touching it.
        let (first_ours, first_theirs) = (i, j);
        let mut end = start;
        loop {
            if let Some(o) = ours_edits.get(i).filter(|o| o.base.start <= end) {
                end = end.max(o.base.end);
                i += 1;
            } else if let Some(t) = theirs_edits.get(j).filter(|t| t.base.start <= end) {
                end = end.max(t.base.end);
                j += 1;
            } else {
                break;
            }
        }

        push_lines(&mut content, &base_lines[pos..start]);
        let region = start..end;
        let ours_span = &ours_edits[first_ours..i];
        let theirs_span = &theirs_edits[first_theirs..j];
        let ours_region = region_lines(ours_span, &ours_lines, &base_lines, &region);
        let theirs_region = region_lines(theirs_span, &theirs_lines, &base_lines, &region);

        if theirs_span.is_empty() || ours_region == theirs_region {
            push_lines(&mut content, ours_region);
        } else if ours_span.is_empty() {
            push_lines(&mut content, theirs_region);
        } else {
            push_conflict(&mut content, ours_region, theirs_region, labels);
            conflicts += 1;
        }
        pos = end;
    }
    push_lines(&mut content, &base_lines[pos..]);

    TextMerge { content, conflicts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn merge(base: &str, ours: &str, theirs: &str) -> TextMerge {
        merge_text(base, ours, theirs, &ConflictLabels::default())
    }

    // ----------------------------------------------------------------
    // Clean merges
    // ----------------------------------------------------------------

    #[test]
    fn one_sided_change_wins() {
        let base = "a\nb\nc\n";
        let m = merge(base, "a\nB\nc\n", base);
        assert!(m.is_clean());
        assert_eq!(m.content, "a\nB\nc\n");

        let m = merge(base, base, "a\nb\nC\n");
        assert_eq!(m.content, "a\nb\nC\n");
    }

    #[test]
    fn disjoint_edits_combine() {
        let m = merge("1\n2\n3\n4\n5\n", "one\n2\n3\n4\n5\n", "1\n2\n3\n4\nfive\n");
        assert!(m.is_clean());
        assert_eq!(m.content, "one\n2\n3\n4\nfive\n");
    }

    #[test]
    fn insertion_and_deletion_combine() {
        let m = merge("a\nb\nc\nd\ne\n", "top\na\nb\nc\nd\ne\n", "a\nb\nc\nd\n");
        assert!(m.is_clean());
        assert_eq!(m.content, "top\na\nb\nc\nd\n");
    }

    #[test]
    fn identical_edits_are_not_a_conflict() {
        let m = merge("a\nb\nc\n", "a\nX\nc\n", "a\nX\nc\n");
        assert!(m.is_clean());
        assert_eq!(m.content, "a\nX\nc\n");
    }

    #[test]
    fn missing_final_newline_is_preserved() {
        let m = merge("a\nb", "A\nb", "a\nb");
        assert_eq!(m.content, "A\nb");
    }

    // ----------------------------------------------------------------
    // Conflicts
    // ----------------------------------------------------------------

    #[test]
    fn overlapping_edits_are_framed() {
        let m = merge("a\nb\nc\n", "a\nX\nc\n", "a\nY\nc\n");
        assert_eq!(m.conflicts, 1);
        assert_eq!(
            m.content,
            "a\n<<<<<<< HEAD\nX\n=======\nY\n>>>>>>> MERGE_HEAD\nc\n"
        );
    }

    #[test]
    fn touching_edits_conflict() {
        let m = merge("a\nb\nc\nd\n", "a\nB\nc\nd\n", "a\nb\nC\nd\n");
        assert_eq!(m.conflicts, 1);
        assert_eq!(
            m.content,
            "a\n<<<<<<< HEAD\nB\nc\n=======\nb\nC\n>>>>>>> MERGE_HEAD\nd\n"
        );
    }

    #[test]
    fn competing_appends_conflict() {
        let m = merge("a\n", "a\nours\n", "a\ntheirs\n");
        assert_eq!(
            m.content,
            "a\n<<<<<<< HEAD\nours\n=======\ntheirs\n>>>>>>> MERGE_HEAD\n"
        );
    }

    #[test]
    fn conflict_without_trailing_newline_keeps_markers_on_own_lines() {
        let m = merge("a", "b", "c");
        assert_eq!(m.content, "<<<<<<< HEAD\nb\n=======\nc\n>>>>>>> MERGE_HEAD\n");
    }

    #[test]
    fn separate_conflicts_are_counted() {
        let base = "1\n2\n3\n4\n5\n";
        let m = merge(base, "x\n2\n3\n4\nx\n", "y\n2\n3\n4\ny\n");
        assert_eq!(m.conflicts, 2);
        assert!(m.content.contains("\n2\n3\n4\n"));
    }

    #[test]
    fn custom_labels() {
        let labels = ConflictLabels::new("main", "feature");
        let m = merge_text("a\n", "b\n", "c\n", &labels);
        assert!(m.content.starts_with("<<<<<<< main\n"));
        assert!(m.content.ends_with(">>>>>>> feature\n"));
    }

    // ----------------------------------------------------------------
    // Properties
    // ----------------------------------------------------------------

    fn text() -> impl Strategy<Value = String> {
        prop::collection::vec("[abc]{0,2}\n", 0..8).prop_map(|lines| lines.concat())
    }

    proptest! {
        #[test]
        fn unchanged_side_yields_other(base in text(), edited in text()) {
            prop_assert_eq!(merge(&base, &edited, &base).content, edited.clone());
            prop_assert_eq!(merge(&base, &base, &edited).content, edited);
        }

        #[test]
        fn same_edit_on_both_sides_is_clean(base in text(), edited in text()) {
            let m = merge(&base, &edited, &edited);
            prop_assert!(m.is_clean());
            prop_assert_eq!(m.content, edited);
        }
    }
}
