//! Error types for the merge engine.

/// Errors that can occur while merging.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// A tree or blob on one of the three sides could not be read.
    #[error("store error: {0}")]
    Store(#[from] megit_store::StoreError),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
