use async_trait::async_trait;
use gws_types::{IndexFile, Segment};

use crate::error::StoreResult;

/// One entry returned by [`ContentStore::list_files`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileListing {
    /// Path relative to the repository root.
    pub path: String,
    /// The path's `info` metadata text, if any.
    pub info: Option<String>,
}

/// Segmented key/value store consumed by the synchronization engine.
///
/// All implementations must satisfy these invariants:
/// - A `(path, segment)` pair holds at most one text value.
/// - Writes to one key never affect another key.
/// - Reads of a missing key return `Ok(None)`, not an error.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Prepare the backend for use. Idempotent.
    async fn init(&self) -> StoreResult<()>;

    /// Read the singleton index record.
    ///
    /// Returns `Ok(None)` if none was ever written and `Err` if the stored
    /// record cannot be read or decoded.
    async fn read_index(&self) -> StoreResult<Option<IndexFile>>;

    /// Replace the singleton index record.
    async fn write_index(&self, index: &IndexFile) -> StoreResult<()>;

    /// Write `content` for `path` into `segment`, overwriting.
    async fn write_blob(&self, path: &str, content: &str, segment: Segment) -> StoreResult<()>;

    /// Read `path` from `segment`.
    ///
    /// With `None`, tries `workspace`, then `base`, then `conflict`.
    async fn read_blob(&self, path: &str, segment: Option<Segment>) -> StoreResult<Option<String>>;

    /// Delete `path` from `segment`.
    ///
    /// With `None`, deletes from every content segment (metadata is kept).
    /// Deleting a missing key is not an error.
    async fn delete_blob(&self, path: &str, segment: Option<Segment>) -> StoreResult<()>;

    /// Enumerate paths stored in `segment` under `prefix`, each paired with
    /// its `info` metadata text.
    ///
    /// When `recursive` is `false`, only direct children of `prefix` are
    /// returned. Results are sorted by path.
    async fn list_files(
        &self,
        prefix: &str,
        segment: Segment,
        recursive: bool,
    ) -> StoreResult<Vec<FileListing>>;
}
