//! Error types for the index crate.

use std::path::PathBuf;

/// Errors that can occur during index and working-tree operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] megit_store::StoreError),

    /// The persisted index could not be encoded or decoded.
    #[error("index serialization error: {0}")]
    Serialization(String),

    /// An index key is not a normalized relative path.
    #[error("invalid index path: {0:?}")]
    InvalidPath(String),

    /// A path given to `add` lies outside the working directory.
    #[error("path is outside the working directory: {}", .0.display())]
    OutsideWorkdir(PathBuf),

    /// I/O error while reading or writing the working tree or index file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
