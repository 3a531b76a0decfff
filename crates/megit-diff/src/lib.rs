//! Diff engine for megit.
//!
//! Compares snapshots at two levels: which paths changed between two flat
//! `path -> oid` maps (or two trees), and which lines changed between two
//! blobs.
//!
//! # Key Types
//!
//! - [`TreeDiff`] / [`TreeChange`] -- path-level changes (added/deleted/modified)
//! - [`BlobDiff`] / [`DiffHunk`] / [`DiffLine`] -- line-level blob diff

pub mod blob_diff;
pub mod error;
pub mod tree_diff;

pub use blob_diff::{diff_blobs, BlobDiff, DiffHunk, DiffLine};
pub use error::{DiffError, DiffResult};
pub use tree_diff::{diff_path_maps, diff_trees, TreeChange, TreeDiff};
