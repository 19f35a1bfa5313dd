//! Index and workspace tracking for git workspace sync.
//!
//! Owns the repository head pointer, classifies pending local changes by
//! diffing the workspace segment against per-path metadata, and performs
//! the local file operations that feed those changes.
//!
//! # Key Types
//!
//! - [`IndexManager`] -- Loads/saves the singleton index record and owns `head`
//! - [`ChangeTracker`] -- Computes the pending change set
//! - [`LocalChangeApplier`] -- Applies one resolved change to workspace/base
//! - [`LocalFileManager`] -- Read/write/delete/rename with tombstone bookkeeping
//! - [`WorkdirStatus`] -- Summary of pending local work

pub mod applier;
pub mod error;
pub mod files;
pub mod manager;
pub mod metadata;
pub mod status;
pub mod tracker;

pub use applier::LocalChangeApplier;
pub use error::{IndexError, IndexResult};
pub use files::LocalFileManager;
pub use manager::IndexManager;
pub use status::WorkdirStatus;
pub use tracker::ChangeTracker;
