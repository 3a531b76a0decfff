//! Reference management for megit.
//!
//! Refs are the human-readable entry points into the commit graph. A ref's
//! stored value is either a raw object id or an indirection to another ref.
//!
//! # Architecture
//!
//! - **Branches** live under `refs/heads/` and advance as commits are made.
//! - **Tags** live under `refs/tags/`.
//! - **Remote refs** live under `refs/remote/` and are only updated by fetch.
//! - **HEAD** names the current branch symbolically, or holds a raw id when
//!   detached.
//! - **MERGE_HEAD** exists only while a three-way merge awaits its commit.
//!
//! # Modules
//!
//! - [`error`]: Error types for ref operations
//! - [`types`]: [`RefValue`], the symbolic/direct union
//! - [`traits`]: The [`RefStore`] trait: one-level storage primitives
//! - [`resolve`]: Dereferencing, updates, iteration and name resolution
//! - [`names`]: Well-known names and branch/tag name validation
//! - [`memory`] / [`fs`]: In-memory and filesystem backends

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod resolve;
pub mod traits;
pub mod types;

pub use error::{RefError, RefResult};
pub use fs::FileRefStore;
pub use memory::InMemoryRefStore;
pub use names::{
    branch_ref, remote_ref, tag_ref, validate_branch_name, validate_remote_name,
    validate_tag_name, HEAD, HEADS_PREFIX, MERGE_HEAD, REMOTE_PREFIX, TAGS_PREFIX,
};
pub use resolve::{delete_ref, get_oid, get_ref, iter_refs, resolve_ref, update_ref, RefIter};
pub use traits::RefStore;
pub use types::RefValue;
