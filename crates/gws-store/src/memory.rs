use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use gws_types::{IndexFile, Segment};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{ContentStore, FileListing};

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. Blobs are held behind a `RwLock` keyed
/// by `(segment, path)`. The index record is kept as serialized JSON so that
/// decoding failures behave like a persistent backend's.
pub struct InMemoryContentStore {
    blobs: RwLock<HashMap<(Segment, String), String>>,
    index: RwLock<Option<String>>,
    read_only: AtomicBool,
}

impl InMemoryContentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            index: RwLock::new(None),
            read_only: AtomicBool::new(false),
        }
    }

    /// Number of blobs across all segments.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Number of blobs in one segment.
    pub fn segment_len(&self, segment: Segment) -> usize {
        self.blobs
            .read()
            .expect("lock poisoned")
            .keys()
            .filter(|(s, _)| *s == segment)
            .count()
    }

    /// Replace the raw serialized index record, bypassing encoding.
    pub fn put_raw_index(&self, raw: impl Into<String>) {
        *self.index.write().expect("lock poisoned") = Some(raw.into());
    }

    /// The raw serialized index record.
    pub fn raw_index(&self) -> Option<String> {
        self.index.read().expect("lock poisoned").clone()
    }

    /// Make every subsequent write fail with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn within(path: &str, prefix: &str, recursive: bool) -> bool {
    let Some(rest) = path.strip_prefix(prefix) else {
        return false;
    };
    recursive || !rest.trim_start_matches('/').contains('/')
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn init(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn read_index(&self) -> StoreResult<Option<IndexFile>> {
        let raw = self.index.read().expect("lock poisoned").clone();
        match raw {
            None => Ok(None),
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| StoreError::CorruptIndex(e.to_string())),
        }
    }

    async fn write_index(&self, index: &IndexFile) -> StoreResult<()> {
        self.check_writable()?;
        let text =
            serde_json::to_string(index).map_err(|e| StoreError::Serialization(e.to_string()))?;
        *self.index.write().expect("lock poisoned") = Some(text);
        Ok(())
    }

    async fn write_blob(&self, path: &str, content: &str, segment: Segment) -> StoreResult<()> {
        self.check_writable()?;
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert((segment, path.to_string()), content.to_string());
        Ok(())
    }

    async fn read_blob(&self, path: &str, segment: Option<Segment>) -> StoreResult<Option<String>> {
        let map = self.blobs.read().expect("lock poisoned");
        let found = match segment {
            Some(segment) => map.get(&(segment, path.to_string())).cloned(),
            None => Segment::READ_FALLBACK
                .iter()
                .find_map(|s| map.get(&(*s, path.to_string())).cloned()),
        };
        Ok(found)
    }

    async fn delete_blob(&self, path: &str, segment: Option<Segment>) -> StoreResult<()> {
        self.check_writable()?;
        let mut map = self.blobs.write().expect("lock poisoned");
        match segment {
            Some(segment) => {
                map.remove(&(segment, path.to_string()));
            }
            None => {
                for segment in Segment::CONTENT {
                    map.remove(&(segment, path.to_string()));
                }
            }
        }
        Ok(())
    }

    async fn list_files(
        &self,
        prefix: &str,
        segment: Segment,
        recursive: bool,
    ) -> StoreResult<Vec<FileListing>> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut listing: Vec<FileListing> = map
            .keys()
            .filter(|(s, p)| *s == segment && within(p, prefix, recursive))
            .map(|(_, p)| FileListing {
                path: p.clone(),
                info: map.get(&(Segment::Info, p.clone())).cloned(),
            })
            .collect();
        listing.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(%segment, prefix, count = listing.len(), "listed files");
        Ok(listing)
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("blob_count", &self.len())
            .field("read_only", &self.read_only.load(Ordering::SeqCst))
            .finish()
    }
}
