//! Content-addressed object storage for megit.
//!
//! This crate implements a hash-keyed object store laid out like git's
//! `.git/objects/` directory. Every blob, tree and commit is stored as an
//! immutable envelope `kind ++ NUL ++ payload` and identified by the SHA-1 of
//! that envelope.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw file contents
//! - [`Tree`] -- sorted directory listing of `(kind, oid, name)` entries
//! - [`Commit`] -- tree snapshot, ordered parents and a message
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`FileObjectStore`] -- one file per object under `objects/<oid>`
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written; rewriting the same bytes is a no-op.
//! 2. Objects reference each other only by id, and the id may dangle.
//! 3. Malformed trees and commits fail loudly with [`StoreError::Integrity`].
//! 4. All I/O errors are propagated, never silently ignored.

pub mod copy;
pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;
pub mod tree;

pub use copy::copy_object;
pub use error::{StoreError, StoreResult};
pub use fs::FileObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, EntryKind, ObjectKind, StoredObject, Tree, TreeEntry};
pub use traits::ObjectStore;
pub use tree::{get_tree, write_tree, TreeWalk, TreeWalkEntry};
