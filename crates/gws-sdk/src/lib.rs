//! High-level SDK for git workspace sync.
//!
//! [`Repository`] wires the content store, index, conflict manager and
//! synchronizer into one handle. This is the main entry point for
//! applications embedding the engine.

pub mod config;
pub mod error;
pub mod repository;
pub mod telemetry;

pub use config::RepositoryConfig;
pub use error::{SdkError, SdkResult};
pub use repository::Repository;

// Re-export key types
pub use gws_index::WorkdirStatus;
pub use gws_store::{ContentStore, InMemoryContentStore};
pub use gws_sync::{
    ConflictDescriptor, PullResult, PushInput, PushResult, RemoteContentSource, RemoteInput,
    RemoteSnapshot,
};
pub use gws_types::{Change, EntryState, HashScheme, IndexEntry, Segment};
