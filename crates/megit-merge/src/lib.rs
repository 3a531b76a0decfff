//! Merge engine for megit.
//!
//! Implements three-way merge of two divergent snapshots against their common
//! ancestor. Paths are merged independently; text files changed on both sides
//! get a line-based merge where overlapping edits are framed by conflict
//! markers instead of failing the merge.
//!
//! # Key Types
//!
//! - [`merge_trees`] -- per-path three-way merge of flattened trees
//! - [`merge_text`] -- line-based three-way content merge
//! - [`MergedTree`] / [`MergeConflict`] -- merge result and the paths that need attention

pub mod error;
pub mod text;
pub mod tree;

pub use error::{MergeError, MergeResult};
pub use text::{merge_text, ConflictLabels, TextMerge};
pub use tree::{merge_path_maps, merge_trees, ConflictKind, MergeConflict, MergedTree};
