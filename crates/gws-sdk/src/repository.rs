use std::collections::BTreeMap;
use std::sync::Arc;

use gws_index::{ChangeTracker, IndexManager, LocalFileManager, WorkdirStatus};
use gws_merge::ConflictManager;
use gws_store::{ContentStore, InMemoryContentStore};
use gws_sync::{
    PullResult, PushInput, PushResult, RawFileFetcher, RemoteContentSource, RemoteInput,
    RemoteSynchronizer,
};
use gws_types::Change;
use tracing::info;

use crate::config::RepositoryConfig;
use crate::error::SdkResult;

/// One offline-first working copy bound to a content store.
pub struct Repository {
    config: RepositoryConfig,
    store: Arc<dyn ContentStore>,
    index: Arc<IndexManager>,
    conflicts: Arc<ConflictManager>,
    tracker: ChangeTracker,
    files: LocalFileManager,
    sync: RemoteSynchronizer,
}

impl Repository {
    /// Initialize `store`, load the index record, and seed adapter metadata
    /// from `config` if the record has none.
    pub async fn open(store: Arc<dyn ContentStore>, config: RepositoryConfig) -> SdkResult<Self> {
        store.init().await?;
        let index = Arc::new(IndexManager::new(store.clone()));
        let record = index.load().await?;
        if record.adapter.is_none() {
            if let Some(adapter) = config.adapter_json()? {
                index.set_adapter(Some(adapter)).await?;
            }
        }

        let scheme = config.hash_scheme;
        let conflicts = Arc::new(ConflictManager::new(store.clone(), index.clone()));
        let sync = RemoteSynchronizer::new(store.clone(), index.clone(), conflicts.clone(), scheme);
        info!(head = %index.head(), ?scheme, "repository opened");
        Ok(Self {
            tracker: ChangeTracker::new(store.clone()),
            files: LocalFileManager::new(store.clone(), scheme),
            config,
            store,
            index,
            conflicts,
            sync,
        })
    }

    /// A repository over a fresh in-memory store with default settings.
    pub async fn in_memory() -> SdkResult<Self> {
        Self::open(Arc::new(InMemoryContentStore::new()), RepositoryConfig::default()).await
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    pub fn index(&self) -> &Arc<IndexManager> {
        &self.index
    }

    pub fn conflict_manager(&self) -> &Arc<ConflictManager> {
        &self.conflicts
    }

    /// Current head (empty before the first sync).
    pub fn head(&self) -> String {
        self.index.head()
    }

    // ---- File operations ----

    pub async fn write_file(&self, path: &str, content: &str) -> SdkResult<()> {
        Ok(self.files.write_file(path, content).await?)
    }

    pub async fn read_file(&self, path: &str) -> SdkResult<Option<String>> {
        Ok(self.files.read_file(path).await?)
    }

    pub async fn delete_file(&self, path: &str) -> SdkResult<()> {
        Ok(self.files.delete_file(path).await?)
    }

    pub async fn rename_file(&self, from: &str, to: &str) -> SdkResult<()> {
        Ok(self.files.rename_file(from, to).await?)
    }

    /// Known paths, tombstones excluded.
    pub async fn list_paths(&self) -> SdkResult<Vec<String>> {
        Ok(self.index.list_paths().await?)
    }

    // ---- Change tracking ----

    pub async fn change_set(&self) -> SdkResult<Vec<Change>> {
        Ok(self.tracker.change_set().await?)
    }

    pub async fn status(&self) -> SdkResult<WorkdirStatus> {
        Ok(self.tracker.status().await?)
    }

    /// Paths currently recorded as conflicted.
    pub async fn conflicts(&self) -> SdkResult<Vec<String>> {
        let entries = self.index.entries().await?;
        Ok(entries
            .into_values()
            .filter(|e| e.is_conflict())
            .map(|e| e.path)
            .collect())
    }

    // ---- Synchronization ----

    pub async fn pull(
        &self,
        remote: impl Into<RemoteInput>,
        base_snapshot: Option<&BTreeMap<String, String>>,
    ) -> SdkResult<PullResult> {
        Ok(self.sync.pull(remote, base_snapshot).await?)
    }

    pub async fn push(&self, input: PushInput) -> SdkResult<PushResult> {
        Ok(self.sync.push(input).await?)
    }

    /// Push the current change set on top of the current head.
    pub async fn commit_pending(&self) -> SdkResult<PushResult> {
        let changes = self.change_set().await?;
        let input = PushInput::new(self.head(), changes);
        Ok(self.sync.push(input).await?)
    }

    pub async fn apply_base_snapshot(
        &self,
        snapshot: &BTreeMap<String, String>,
        head_sha: &str,
    ) -> SdkResult<()> {
        Ok(self.sync.apply_base_snapshot(snapshot, head_sha).await?)
    }

    /// Accept the remote side of a conflict. `false` if nothing was resolved.
    pub async fn resolve_conflict(&self, path: &str) -> bool {
        self.conflicts.resolve_conflict(path).await
    }

    /// Base content of `path`, hydrated through `source` on first read.
    pub async fn fetch_base(&self, path: &str, source: Option<&RemoteContentSource>) -> Option<String> {
        self.sync.fetch_base_if_missing(path, source).await
    }

    /// A path-addressed content source on the configured branch.
    pub fn raw_source(&self, fetcher: Arc<dyn RawFileFetcher>) -> RemoteContentSource {
        RemoteContentSource::ByPath {
            fetcher,
            branch: self.config.branch.clone(),
        }
    }
}
