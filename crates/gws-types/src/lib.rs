//! Foundation types for git workspace sync (GWS).
//!
//! This crate provides the data model shared by every other GWS crate: the
//! per-path index entry, the repository-wide index record, the transient
//! change set, content-store segments, and the content hashing schemes.
//!
//! # Key Types
//!
//! - [`IndexEntry`] -- Per-path metadata (state plus base/remote/workspace hashes)
//! - [`EntryState`] -- Lifecycle state of a tracked path
//! - [`IndexFile`] -- Singleton repository record (`head`, last commit key, adapter metadata)
//! - [`Change`] -- A pending create/update/delete produced by diffing
//! - [`Segment`] -- Named partition of the content store for a path
//! - [`HashScheme`] -- Content addressing scheme (Git blob SHA-1 or BLAKE3)

pub mod change;
pub mod entry;
pub mod error;
pub mod hash;
pub mod index_file;
pub mod segment;

pub use change::{Change, ChangeKind};
pub use entry::{EntryState, IndexEntry};
pub use error::TypeError;
pub use hash::{commit_key, commit_sha, sha1_hex, HashScheme};
pub use index_file::IndexFile;
pub use segment::Segment;
