use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] gws_store::StoreError),

    #[error("index error: {0}")]
    Index(#[from] gws_index::IndexError),

    #[error("merge error: {0}")]
    Merge(#[from] gws_merge::MergeError),

    #[error("sync error: {0}")]
    Sync(#[from] gws_sync::SyncError),
}

pub type SdkResult<T> = Result<T, SdkError>;
