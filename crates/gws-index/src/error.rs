//! Error types for the index crate.

/// Errors that can occur during index and workspace operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// A rename or read named a path with no content.
    #[error("Source file not found: {0}")]
    SourceNotFound(String),

    /// An invalid path was provided.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] gws_store::StoreError),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] gws_types::TypeError),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
