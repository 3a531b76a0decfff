//! Error types for reference operations.

use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The branch or tag name is invalid.
    #[error("invalid branch name: {name}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// The ref name would escape the metadata directory.
    #[error("invalid ref name: {name:?}")]
    InvalidName { name: String },

    /// An existing ref file holds neither `ref: <name>` nor a raw id.
    #[error("malformed ref {name}: {content:?}")]
    Malformed { name: String, content: String },

    /// A symbolic ref was written with an empty target.
    #[error("refusing to write empty value to ref {name}")]
    EmptyValue { name: String },

    /// Symbolic resolution went around a cycle or too deep.
    #[error("symbolic ref chain starting at {name} is too deep or cyclic")]
    SymrefLoop { name: String },

    /// The name resolves to neither a ref nor a well-formed object id.
    #[error("unknown revision or ref: {name}")]
    InvalidReference { name: String },

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ref operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
