//! Applies a single resolved change to the local segments.

use std::sync::Arc;

use gws_store::ContentStore;
use gws_types::{Change, HashScheme, IndexEntry, Segment};
use tracing::debug;

use crate::error::IndexResult;
use crate::metadata::{purge_entry, write_synced_entry};

pub struct LocalChangeApplier {
    store: Arc<dyn ContentStore>,
    scheme: HashScheme,
}

impl LocalChangeApplier {
    pub fn new(store: Arc<dyn ContentStore>, scheme: HashScheme) -> Self {
        Self { store, scheme }
    }

    /// Make `content` the committed base for `path`.
    ///
    /// The workspace copy is cleared first so it cannot shadow the new base.
    pub async fn apply_create_or_update(&self, path: &str, content: &str) -> IndexResult<()> {
        self.store.delete_blob(path, Some(Segment::Workspace)).await?;
        self.store.write_blob(path, content, Segment::Base).await?;
        Ok(())
    }

    /// Forget `path`: metadata first, then content in every segment.
    pub async fn apply_delete(&self, path: &str) -> IndexResult<()> {
        purge_entry(self.store.as_ref(), path).await?;
        self.store.delete_blob(path, None).await?;
        Ok(())
    }

    /// Apply a committed change, content and metadata.
    ///
    /// Creates and updates leave a clean `base` entry whose `baseSha` is the
    /// content hash; deletes purge the path.
    pub async fn apply_change(&self, change: &Change) -> IndexResult<()> {
        match change {
            Change::Create { path, content } | Change::Update { path, content, .. } => {
                self.apply_create_or_update(path, content).await?;
                let entry = IndexEntry::base(path.as_str(), self.scheme.hash_str(content));
                write_synced_entry(self.store.as_ref(), &entry).await?;
                self.store.delete_blob(path, Some(Segment::InfoWorkspace)).await?;
                debug!(path = %path, base_sha = ?entry.base_sha, "change applied");
            }
            Change::Delete { path, .. } => {
                self.apply_delete(path).await?;
                debug!(path = %path, "delete applied");
            }
        }
        Ok(())
    }
}
