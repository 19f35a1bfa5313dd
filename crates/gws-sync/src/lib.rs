//! Synchronization protocol for git workspace sync.
//!
//! Pull reconciles a remote tree by comparing hashes and records conflicts
//! as data; content is only transferred on first read through
//! [`RemoteSynchronizer::fetch_base_if_missing`]. Push is an optimistic,
//! single-parent fast-forward: a stale parent is rejected, never merged.

pub mod error;
pub mod remote;
pub mod transport;
pub mod types;

pub use error::{SyncError, SyncResult};
pub use remote::RemoteSynchronizer;
pub use transport::{BlobEncoding, BlobFetcher, RawFileFetcher, RemoteBlob, RemoteContentSource, SnapshotContent};
pub use types::{
    ConflictDescriptor, ConflictKind, PullResult, PushInput, PushResult, RemoteInput, RemoteSnapshot,
};
