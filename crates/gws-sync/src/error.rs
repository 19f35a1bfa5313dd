use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("pull required: push has no parent")]
    MissingParent,

    #[error("non-fast-forward: parent {parent} is not head {head}; pull required")]
    NonFastForward { parent: String, head: String },

    #[error("no changes to commit")]
    EmptyChangeSet,

    #[error("remote error: {0}")]
    Remote(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("store error: {0}")]
    Store(#[from] gws_store::StoreError),

    #[error("index error: {0}")]
    Index(#[from] gws_index::IndexError),

    #[error("merge error: {0}")]
    Merge(#[from] gws_merge::MergeError),

    #[error("type error: {0}")]
    Type(#[from] gws_types::TypeError),
}

pub type SyncResult<T> = Result<T, SyncError>;
