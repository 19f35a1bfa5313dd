//! The repository-wide index record and its `head` pointer.
//!
//! [`IndexManager`] is the only owner of `head` and `lastCommitKey`. Other
//! components read and advance `head` through [`IndexManager::head`] and
//! [`IndexManager::set_head`], then call [`IndexManager::save`] to persist.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use gws_store::ContentStore;
use gws_types::{EntryState, IndexEntry, IndexFile, Segment};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::IndexResult;
use crate::metadata::parse_info;

#[derive(Debug, Default)]
struct HeadState {
    head: String,
    last_commit_key: Option<String>,
}

/// Owns the singleton index record.
pub struct IndexManager {
    store: Arc<dyn ContentStore>,
    state: RwLock<HeadState>,
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager")
            .field("head", &self.head())
            .field("last_commit_key", &self.last_commit_key())
            .finish()
    }
}

impl IndexManager {
    /// Create a manager with an empty head. Call [`load`](Self::load) next.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            state: RwLock::new(HeadState::default()),
        }
    }

    /// The backing content store.
    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Current head (empty when never reconciled).
    pub fn head(&self) -> String {
        self.state.read().expect("lock poisoned").head.clone()
    }

    /// Move head in memory. Persist with [`save`](Self::save).
    pub fn set_head(&self, head: impl Into<String>) {
        self.state.write().expect("lock poisoned").head = head.into();
    }

    /// Idempotency key of the last pushed commit.
    pub fn last_commit_key(&self) -> Option<String> {
        self.state.read().expect("lock poisoned").last_commit_key.clone()
    }

    pub fn set_last_commit_key(&self, key: Option<String>) {
        self.state.write().expect("lock poisoned").last_commit_key = key;
    }

    /// Load the persisted record into memory.
    ///
    /// A record that cannot be read is replaced by an empty one, which is
    /// persisted immediately so the store never stays unreadable.
    pub async fn load(&self) -> IndexResult<IndexFile> {
        match self.store.read_index().await {
            Ok(Some(record)) => {
                {
                    let mut state = self.state.write().expect("lock poisoned");
                    state.head = record.head.clone();
                    state.last_commit_key = record.last_commit_key.clone();
                }
                debug!(head = %record.head, "index loaded");
                Ok(record)
            }
            Ok(None) => {
                *self.state.write().expect("lock poisoned") = HeadState::default();
                debug!("no index record; starting unborn");
                Ok(IndexFile::default())
            }
            Err(e) => {
                warn!(error = %e, "index record unreadable; resetting");
                *self.state.write().expect("lock poisoned") = HeadState::default();
                let reset = IndexFile::default();
                self.store.write_index(&reset).await?;
                info!("index record reset");
                Ok(reset)
            }
        }
    }

    /// Persist `head` and `lastCommitKey`, keeping every other field of the
    /// stored record verbatim.
    pub async fn save(&self) -> IndexResult<()> {
        let mut record = self.persisted_or_default().await;
        {
            let state = self.state.read().expect("lock poisoned");
            record.head = state.head.clone();
            record.last_commit_key = state.last_commit_key.clone();
        }
        self.store.write_index(&record).await?;
        debug!(head = %record.head, "index saved");
        Ok(())
    }

    /// Replace the opaque hosting metadata and persist.
    pub async fn set_adapter(&self, adapter: Option<Value>) -> IndexResult<()> {
        let mut record = self.persisted_or_default().await;
        record.adapter = adapter;
        {
            let state = self.state.read().expect("lock poisoned");
            record.head = state.head.clone();
            record.last_commit_key = state.last_commit_key.clone();
        }
        self.store.write_index(&record).await?;
        Ok(())
    }

    /// A snapshot of the record: persisted fields, the in-memory head and
    /// commit key, and entries materialized from `info` records.
    pub async fn index(&self) -> IndexResult<IndexFile> {
        let mut record = self.persisted_or_default().await;
        {
            let state = self.state.read().expect("lock poisoned");
            record.head = state.head.clone();
            record.last_commit_key = state.last_commit_key.clone();
        }
        record.entries.extend(self.entries().await?);
        Ok(record)
    }

    /// All parseable `info` entries, keyed by path.
    pub async fn entries(&self) -> IndexResult<BTreeMap<String, IndexEntry>> {
        let listing = self.store.list_files("", Segment::Info, true).await?;
        Ok(listing
            .into_iter()
            .filter_map(|f| {
                let entry = parse_info(&f.path, f.info.as_deref()?)?;
                Some((f.path, entry))
            })
            .collect())
    }

    /// Every path with metadata, excluding tombstones.
    ///
    /// Paths whose metadata cannot be parsed are still listed.
    pub async fn list_paths(&self) -> IndexResult<Vec<String>> {
        let listing = self.store.list_files("", Segment::Info, true).await?;
        let paths = listing
            .into_iter()
            .filter(|f| match f.info.as_deref().and_then(|t| parse_info(&f.path, t)) {
                Some(entry) => entry.state != EntryState::Deleted,
                None => true,
            })
            .map(|f| f.path)
            .collect();
        Ok(paths)
    }

    async fn persisted_or_default(&self) -> IndexFile {
        match self.store.read_index().await {
            Ok(Some(record)) => record,
            Ok(None) => IndexFile::default(),
            Err(e) => {
                warn!(error = %e, "index record unreadable; merging onto empty record");
                IndexFile::default()
            }
        }
    }
}
