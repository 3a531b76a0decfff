//! Staging index and working-tree materialization for megit.
//!
//! The index is a flat `path -> blob id` mapping persisted as JSON. It is
//! mutated only through a scoped guard that writes it back exactly once,
//! whether the scope succeeds or fails.
//!
//! # Key Types
//!
//! - [`Index`] -- the in-memory staging map and its tree builder
//! - [`IndexGuard`] / [`with_index`] -- load, mutate, persist on exit
//! - [`Workdir`] -- ignore predicate, hashing walks, clearing and repopulating
//! - [`WorkdirStatus`] -- staged, unstaged and untracked paths

pub mod error;
pub mod index;
pub mod status;
pub mod workdir;

pub use error::{IndexError, IndexResult};
pub use index::{with_index, Index, IndexGuard};
pub use status::{compute_status, FileStatus, StatusEntry, WorkdirStatus};
pub use workdir::{Workdir, METADATA_DIR};
