//! Segmented content storage for git workspace sync.
//!
//! The synchronization engine depends on exactly one persistence primitive:
//! a key/value store keyed by path and [`Segment`]. This crate defines that
//! contract as the [`ContentStore`] trait and ships an in-memory backend.
//!
//! # Segments
//!
//! - `workspace` -- uncommitted local edits
//! - `base` -- last-known-synced content
//! - `conflict` / `conflictBlob` -- remote content pending resolution
//! - `info` / `info-workspace` / `info-git` -- serialized per-path metadata
//!
//! # Design Rules
//!
//! 1. The store never interprets blob contents; metadata is opaque JSON text.
//! 2. There is no transaction or multi-key atomic primitive. Cross-key
//!    invariants are kept by the callers' ordering of writes.
//! 3. All I/O errors are propagated, never silently ignored.
//!
//! [`Segment`]: gws_types::Segment

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryContentStore;
pub use traits::{ContentStore, FileListing};
