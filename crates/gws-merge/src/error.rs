use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no metadata for conflicted path: {0}")]
    MissingEntry(String),

    #[error("store error: {0}")]
    Store(#[from] gws_store::StoreError),

    #[error("index error: {0}")]
    Index(#[from] gws_index::IndexError),
}

pub type MergeResult<T> = Result<T, MergeError>;
