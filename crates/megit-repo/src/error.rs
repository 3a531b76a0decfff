use std::path::PathBuf;

use megit_dag::DagError;
use megit_diff::DiffError;
use megit_index::IndexError;
use megit_merge::MergeError;
use megit_refs::RefError;
use megit_store::StoreError;
use megit_sync::SyncError;
use megit_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not a megit repository: {0}")]
    NotARepository(PathBuf),

    #[error("HEAD does not point at a commit")]
    NoHead,

    #[error("no common history between {ours} and {theirs}")]
    NoCommonHistory { ours: ObjectId, theirs: ObjectId },

    #[error("invalid config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] RefError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("history error: {0}")]
    Dag(#[from] DagError),

    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Coarse classification of a [`RepoError`] for callers that only need to
/// decide how to report it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A missing object, ref target or repository.
    NotFound,
    /// An object was read as the wrong kind.
    TypeMismatch,
    /// Malformed stored data: a bad tree entry, commit header or ref file.
    Integrity,
    /// A name that resolves to neither a ref nor an object id.
    InvalidReference,
    /// Two commits share no ancestor.
    NoCommonHistory,
    Io,
    /// The request itself is invalid: a bad name, a path outside the
    /// working directory, a rejected push.
    Usage,
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotARepository(_) => ErrorKind::NotFound,
            Self::NoHead => ErrorKind::InvalidReference,
            Self::NoCommonHistory { .. } => ErrorKind::NoCommonHistory,
            Self::Config { .. } => ErrorKind::Usage,
            Self::Store(e) => store_kind(e),
            Self::Ref(e) => ref_kind(e),
            Self::Index(e) => index_kind(e),
            Self::Dag(DagError::Store(e)) => store_kind(e),
            Self::Diff(DiffError::Store(e)) => store_kind(e),
            Self::Merge(MergeError::Store(e)) => store_kind(e),
            Self::Sync(e) => match e {
                SyncError::NotFastForward(_) => ErrorKind::Usage,
                SyncError::MissingRef(_) => ErrorKind::InvalidReference,
                SyncError::Store(e) => store_kind(e),
                SyncError::Ref(e) => ref_kind(e),
                SyncError::Dag(DagError::Store(e)) => store_kind(e),
            },
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

fn store_kind(e: &StoreError) -> ErrorKind {
    match e {
        StoreError::NotFound(_) => ErrorKind::NotFound,
        StoreError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
        StoreError::Integrity(_) | StoreError::CorruptObject { .. } => ErrorKind::Integrity,
        StoreError::Io(_) => ErrorKind::Io,
    }
}

fn ref_kind(e: &RefError) -> ErrorKind {
    match e {
        RefError::InvalidReference { .. } => ErrorKind::InvalidReference,
        RefError::InvalidBranchName { .. } | RefError::InvalidName { .. } | RefError::EmptyValue { .. } => {
            ErrorKind::Usage
        }
        RefError::Malformed { .. } | RefError::SymrefLoop { .. } => ErrorKind::Integrity,
        RefError::Io(_) => ErrorKind::Io,
    }
}

fn index_kind(e: &IndexError) -> ErrorKind {
    match e {
        IndexError::Store(e) => store_kind(e),
        IndexError::Serialization(_) => ErrorKind::Integrity,
        IndexError::InvalidPath(_) | IndexError::OutsideWorkdir(_) => ErrorKind::Usage,
        IndexError::Io(_) => ErrorKind::Io,
    }
}
