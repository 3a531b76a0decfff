//! Commit graph traversal for megit.
//!
//! Commits form a DAG through their ordered parent lists. Everything here is
//! a pull-based walk over an object store with an explicit visited set, so
//! each commit or object is produced at most once.
//!
//! # Key Types
//!
//! - [`CommitWalk`] -- first-parent-first history walk
//! - [`ObjectWalk`] -- every commit, tree and blob reachable from a set of commits
//! - [`merge_base`] / [`is_ancestor_of`] -- ancestry queries

pub mod ancestry;
pub mod error;
pub mod objects;
pub mod walk;

pub use ancestry::{ancestors, is_ancestor_of, merge_base};
pub use error::{DagError, DagResult};
pub use objects::{iter_objects_in_commits, ObjectWalk};
pub use walk::{iter_commits_and_parents, CommitWalk};
