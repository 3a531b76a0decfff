//! Repository API for megit.
//!
//! [`Repository`] owns one working directory and its `.megit` metadata
//! directory and threads that root through every operation: staging,
//! snapshots, commits, branches and tags, checkout, merge, status, diff, log
//! and transfers to another local repository. There is no process-wide
//! repository state; two `Repository` values can be used side by side.

pub mod config;
pub mod error;
pub mod log;
pub mod merge;
pub mod remote;
pub mod repository;

pub use config::RepoConfig;
pub use error::{ErrorKind, RepoError, RepoResult};
pub use log::{Log, LogEntry};
pub use merge::MergeOutcome;
pub use repository::{RepoStatus, Repository};

// Re-export key types
pub use megit_diff::{BlobDiff, TreeChange, TreeDiff};
pub use megit_index::{FileStatus, StatusEntry, WorkdirStatus};
pub use megit_merge::{ConflictKind, MergeConflict};
pub use megit_refs::RefValue;
pub use megit_store::{Commit, ObjectKind, Tree, TreeEntry};
pub use megit_sync::{FetchResult, PushResult, RefUpdate};
pub use megit_types::ObjectId;
