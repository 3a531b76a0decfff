//! Error types for commit graph traversal.

/// Errors that can occur during DAG operations.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// A commit or tree on the walk could not be read or decoded.
    #[error("store error: {0}")]
    Store(#[from] megit_store::StoreError),
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
