use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("not a fast-forward update for ref {0}")]
    NotFastForward(String),

    #[error("ref {0} does not point at a commit")]
    MissingRef(String),

    #[error("store error: {0}")]
    Store(#[from] megit_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] megit_refs::RefError),

    #[error("history walk failed: {0}")]
    Dag(#[from] megit_dag::DagError),
}

pub type SyncResult<T> = Result<T, SyncError>;
