//! Per-path conflict records.
//!
//! The `info` record of a conflicted path is authoritative: it carries
//! `state = conflict` and the competing `remoteSha`. Remote content parked in
//! the `conflict` segment is a cache and may be missing.

use std::collections::BTreeMap;
use std::sync::Arc;

use gws_index::metadata::{read_entry, write_entry, write_synced_entry};
use gws_index::IndexManager;
use gws_store::ContentStore;
use gws_types::{EntryState, IndexEntry, Segment};
use tracing::{debug, info, warn};

use crate::error::{MergeError, MergeResult};

/// Segments holding competing remote content.
const CONFLICT_SEGMENTS: [Segment; 2] = [Segment::Conflict, Segment::ConflictBlob];

pub struct ConflictManager {
    store: Arc<dyn ContentStore>,
    index: Arc<IndexManager>,
}

impl ConflictManager {
    pub fn new(store: Arc<dyn ContentStore>, index: Arc<IndexManager>) -> Self {
        Self { store, index }
    }

    /// The persisted remote content for `path`, if any.
    pub async fn read_conflict(&self, path: &str) -> MergeResult<Option<String>> {
        for segment in CONFLICT_SEGMENTS {
            if let Some(content) = self.store.read_blob(path, Some(segment)).await? {
                return Ok(Some(content));
            }
        }
        Ok(None)
    }

    /// Mark `entry` as conflicting with remote content `remote_sha`.
    pub async fn set_index_entry_to_conflict(
        &self,
        path: &str,
        mut entry: IndexEntry,
        remote_sha: &str,
    ) -> MergeResult<IndexEntry> {
        entry.path = path.to_string();
        entry.state = EntryState::Conflict;
        entry.remote_sha = Some(remote_sha.to_string());
        entry.touch();
        write_entry(self.store.as_ref(), &entry, Segment::Info).await?;
        debug!(path, remote_sha, "entry marked conflicted");
        Ok(entry)
    }

    /// Park remote `content` in the conflict slot. `None` is a no-op.
    pub async fn try_persist_remote_content(
        &self,
        path: &str,
        content: Option<&str>,
    ) -> MergeResult<()> {
        if let Some(content) = content {
            self.store.write_blob(path, content, Segment::Conflict).await?;
        }
        Ok(())
    }

    /// Best-effort [`try_persist_remote_content`](Self::try_persist_remote_content).
    ///
    /// Returns `false` if the write failed; the conflict record stands either way.
    pub async fn persist_remote_content_as_conflict(
        &self,
        path: &str,
        content: Option<&str>,
    ) -> bool {
        match self.try_persist_remote_content(path, content).await {
            Ok(()) => true,
            Err(e) => {
                warn!(path, error = %e, "failed to persist conflict content");
                false
            }
        }
    }

    /// Accept the remote version of `path` as the new base and advance
    /// `head` to the resolved `baseSha`.
    ///
    /// Returns `Ok(false)` when `path` has no readable metadata.
    pub async fn try_resolve_conflict(&self, path: &str) -> MergeResult<bool> {
        let content = self.read_conflict(path).await?;
        let Some(mut entry) = self.current_entry(path).await? else {
            debug!(path, "nothing to resolve");
            return Ok(false);
        };

        if let Some(remote_sha) = entry.remote_sha.take() {
            match content.as_deref() {
                Some(content) => self.store.write_blob(path, content, Segment::Base).await?,
                // Old base no longer matches; let lazy fetch hydrate the new one.
                None => self.store.delete_blob(path, Some(Segment::Base)).await?,
            }
            entry.base_sha = Some(remote_sha);
            entry.state = EntryState::Base;
        }
        entry.touch();

        self.clear_conflict_slots(path).await;
        write_synced_entry(self.store.as_ref(), &entry).await?;

        if let Some(base_sha) = &entry.base_sha {
            self.index.set_head(base_sha.as_str());
        }
        self.index.save().await?;
        info!(path, base_sha = ?entry.base_sha, "conflict resolved");
        Ok(true)
    }

    /// Best-effort [`try_resolve_conflict`](Self::try_resolve_conflict).
    pub async fn resolve_conflict(&self, path: &str) -> bool {
        match self.try_resolve_conflict(path).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(path, error = %e, "conflict resolution failed");
                false
            }
        }
    }

    /// True iff every path records a `remoteSha` already equal to its `baseSha`.
    pub async fn are_all_resolved(&self, paths: &[String]) -> MergeResult<bool> {
        for path in paths {
            let Some(entry) = read_entry(self.store.as_ref(), path, Segment::Info).await? else {
                return Ok(false);
            };
            match (&entry.remote_sha, &entry.base_sha) {
                (Some(remote), Some(base)) if remote == base => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Finalize one conflict into a clean base.
    ///
    /// Content comes from `base_snapshot`, else the conflict slot, else the
    /// existing base.
    pub async fn promote_resolved_conflict_entry(
        &self,
        path: &str,
        base_snapshot: Option<&BTreeMap<String, String>>,
    ) -> MergeResult<()> {
        let content = match base_snapshot.and_then(|s| s.get(path)) {
            Some(content) => Some(content.clone()),
            None => match self.read_conflict(path).await? {
                Some(content) => Some(content),
                None => self.store.read_blob(path, Some(Segment::Base)).await?,
            },
        };
        if let Some(content) = content {
            self.store.write_blob(path, &content, Segment::Base).await?;
        }

        let mut entry = read_entry(self.store.as_ref(), path, Segment::Info)
            .await?
            .ok_or_else(|| MergeError::MissingEntry(path.to_string()))?;
        if let Some(remote_sha) = entry.remote_sha.take() {
            entry.base_sha = Some(remote_sha);
            entry.state = EntryState::Base;
        }
        entry.touch();
        write_synced_entry(self.store.as_ref(), &entry).await?;
        self.clear_conflict_slots(path).await;
        Ok(())
    }

    /// Drop a conflict whose remote side came back to the recorded base.
    ///
    /// Only the local side differs now: the entry reverts to `modified`, or
    /// to a `deleted` tombstone when no workspace edit is recorded.
    pub async fn withdraw_conflict(&self, mut entry: IndexEntry) -> MergeResult<IndexEntry> {
        entry.state = if entry.workspace_sha.is_some() {
            EntryState::Modified
        } else {
            EntryState::Deleted
        };
        entry.remote_sha = None;
        entry.touch();
        write_entry(self.store.as_ref(), &entry, Segment::Info).await?;
        self.clear_conflict_slots(&entry.path).await;
        debug!(path = %entry.path, state = ?entry.state, "conflict withdrawn");
        Ok(entry)
    }

    /// Promote a whole batch and advance `head`, but only if every entry is
    /// already resolved. Returns whether anything was promoted.
    pub async fn promote_resolved_conflicts(
        &self,
        paths: &[String],
        base_snapshot: Option<&BTreeMap<String, String>>,
        remote_head: &str,
    ) -> MergeResult<bool> {
        if paths.is_empty() || !self.are_all_resolved(paths).await? {
            return Ok(false);
        }
        for path in paths {
            self.promote_resolved_conflict_entry(path, base_snapshot).await?;
        }
        self.index.set_head(remote_head);
        self.index.save().await?;
        info!(count = paths.len(), head = remote_head, "resolved conflicts promoted");
        Ok(true)
    }

    /// Metadata for `path`: the `info` record, else the aggregate index.
    async fn current_entry(&self, path: &str) -> MergeResult<Option<IndexEntry>> {
        if let Some(entry) = read_entry(self.store.as_ref(), path, Segment::Info).await? {
            return Ok(Some(entry));
        }
        match self.store.read_index().await {
            Ok(index) => Ok(index.and_then(|mut i| i.entries.remove(path))),
            Err(e) => {
                debug!(path, error = %e, "index record unreadable");
                Ok(None)
            }
        }
    }

    async fn clear_conflict_slots(&self, path: &str) {
        for segment in CONFLICT_SEGMENTS {
            if let Err(e) = self.store.delete_blob(path, Some(segment)).await {
                warn!(path, segment = %segment, error = %e, "failed to clear conflict slot");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gws_store::InMemoryContentStore;
    use gws_types::{HashScheme, IndexFile};

    fn setup() -> (Arc<InMemoryContentStore>, Arc<IndexManager>, ConflictManager) {
        let store = Arc::new(InMemoryContentStore::new());
        let index = Arc::new(IndexManager::new(store.clone()));
        let conflicts = ConflictManager::new(store.clone(), index.clone());
        (store, index, conflicts)
    }

    async fn info(store: &InMemoryContentStore, path: &str) -> Option<IndexEntry> {
        read_entry(store, path, Segment::Info).await.unwrap()
    }

    async fn conflicted(
        store: &InMemoryContentStore,
        conflicts: &ConflictManager,
        path: &str,
        remote_content: &str,
    ) -> String {
        let remote_sha = HashScheme::GitBlob.hash_str(remote_content);
        let mut entry = IndexEntry::base(path, "b0");
        entry.state = EntryState::Modified;
        entry.workspace_sha = Some("w1".into());
        store.write_blob(path, "mine", Segment::Workspace).await.unwrap();
        store.write_blob(path, "old", Segment::Base).await.unwrap();
        conflicts
            .set_index_entry_to_conflict(path, entry, &remote_sha)
            .await
            .unwrap();
        assert!(
            conflicts
                .persist_remote_content_as_conflict(path, Some(remote_content))
                .await
        );
        remote_sha
    }

    #[tokio::test]
    async fn marking_persists_conflict_state() {
        let (store, _index, conflicts) = setup();
        let entry = conflicts
            .set_index_entry_to_conflict("a.txt", IndexEntry::base("a.txt", "b0"), "r1")
            .await
            .unwrap();
        assert!(entry.is_conflict());

        let stored = info(&store, "a.txt").await.unwrap();
        assert_eq!(stored.state, EntryState::Conflict);
        assert_eq!(stored.remote_sha.as_deref(), Some("r1"));
        assert_eq!(stored.base_sha.as_deref(), Some("b0"));
    }

    #[tokio::test]
    async fn read_conflict_falls_back_to_conflict_blob() {
        let (store, _index, conflicts) = setup();
        assert!(conflicts.read_conflict("a.txt").await.unwrap().is_none());

        store.write_blob("a.txt", "blob", Segment::ConflictBlob).await.unwrap();
        assert_eq!(conflicts.read_conflict("a.txt").await.unwrap().as_deref(), Some("blob"));

        store.write_blob("a.txt", "text", Segment::Conflict).await.unwrap();
        assert_eq!(conflicts.read_conflict("a.txt").await.unwrap().as_deref(), Some("text"));
    }

    #[tokio::test]
    async fn persisting_nothing_is_a_noop() {
        let (store, _index, conflicts) = setup();
        assert!(conflicts.persist_remote_content_as_conflict("a.txt", None).await);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn persist_failure_is_swallowed() {
        let (store, _index, conflicts) = setup();
        store.set_read_only(true);
        assert!(!conflicts.persist_remote_content_as_conflict("a.txt", Some("x")).await);
        assert!(conflicts.try_persist_remote_content("a.txt", Some("x")).await.is_err());
    }

    #[tokio::test]
    async fn resolution_round_trip() {
        let (store, index, conflicts) = setup();
        let remote_sha = conflicted(&store, &conflicts, "a.txt", "theirs").await;

        assert!(conflicts.resolve_conflict("a.txt").await);

        let base = store.read_blob("a.txt", Some(Segment::Base)).await.unwrap().unwrap();
        assert_eq!(HashScheme::GitBlob.hash_str(&base), remote_sha);
        assert!(conflicts.read_conflict("a.txt").await.unwrap().is_none());

        let entry = info(&store, "a.txt").await.unwrap();
        assert_eq!(entry.state, EntryState::Base);
        assert_eq!(entry.base_sha.as_deref(), Some(remote_sha.as_str()));
        assert!(entry.remote_sha.is_none());
        assert_eq!(index.head(), remote_sha);
        assert_eq!(store.read_index().await.unwrap().unwrap().head, remote_sha);

        let synced = read_entry(store.as_ref(), "a.txt", Segment::InfoGit).await.unwrap().unwrap();
        assert_eq!(synced.base_sha.as_deref(), Some(remote_sha.as_str()));
    }

    #[tokio::test]
    async fn resolution_without_remote_sha_advances_head_to_base() {
        let (store, index, conflicts) = setup();
        index.set_head("H1");
        let mut entry = IndexEntry::base("a.txt", "b0");
        entry.state = EntryState::Conflict;
        write_entry(store.as_ref(), &entry, Segment::Info).await.unwrap();

        assert!(conflicts.resolve_conflict("a.txt").await);
        assert_eq!(index.head(), "b0");
        assert_eq!(info(&store, "a.txt").await.unwrap().base_sha.as_deref(), Some("b0"));
    }

    #[tokio::test]
    async fn resolution_of_unsynced_conflict_leaves_head() {
        let (store, index, conflicts) = setup();
        index.set_head("H1");
        let mut entry = IndexEntry::added("a.txt", "w1");
        entry.state = EntryState::Conflict;
        write_entry(store.as_ref(), &entry, Segment::Info).await.unwrap();

        assert!(conflicts.resolve_conflict("a.txt").await);
        assert_eq!(index.head(), "H1");
    }

    #[tokio::test]
    async fn resolution_keeps_local_edit() {
        let (store, _index, conflicts) = setup();
        conflicted(&store, &conflicts, "a.txt", "theirs").await;

        assert!(conflicts.resolve_conflict("a.txt").await);
        assert_eq!(
            store.read_blob("a.txt", Some(Segment::Workspace)).await.unwrap().as_deref(),
            Some("mine")
        );
    }

    #[tokio::test]
    async fn resolution_without_content_drops_stale_base() {
        let (store, _index, conflicts) = setup();
        store.write_blob("a.txt", "old", Segment::Base).await.unwrap();
        conflicts
            .set_index_entry_to_conflict("a.txt", IndexEntry::base("a.txt", "b0"), "r1")
            .await
            .unwrap();

        assert!(conflicts.resolve_conflict("a.txt").await);
        assert!(store.read_blob("a.txt", Some(Segment::Base)).await.unwrap().is_none());
        assert_eq!(info(&store, "a.txt").await.unwrap().base_sha.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn resolution_falls_back_to_aggregate_index() {
        let (store, _index, conflicts) = setup();
        let mut entry = IndexEntry::base("a.txt", "b0");
        entry.state = EntryState::Conflict;
        entry.remote_sha = Some("r1".into());
        let mut file = IndexFile::with_head("H1");
        file.entries.insert("a.txt".into(), entry);
        store.write_index(&file).await.unwrap();
        store.write_blob("a.txt", "theirs", Segment::Conflict).await.unwrap();

        assert!(conflicts.resolve_conflict("a.txt").await);
        let entry = info(&store, "a.txt").await.unwrap();
        assert_eq!(entry.state, EntryState::Base);
        assert_eq!(entry.base_sha.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn resolving_unknown_path_is_false() {
        let (_store, _index, conflicts) = setup();
        assert!(!conflicts.resolve_conflict("nope.txt").await);
    }

    #[tokio::test]
    async fn resolving_on_read_only_store_is_false() {
        let (store, _index, conflicts) = setup();
        conflicted(&store, &conflicts, "a.txt", "theirs").await;
        store.set_read_only(true);
        assert!(!conflicts.resolve_conflict("a.txt").await);
    }

    #[tokio::test]
    async fn all_resolved_requires_matching_shas() {
        let (store, _index, conflicts) = setup();
        let mut done = IndexEntry::base("done.txt", "r1");
        done.remote_sha = Some("r1".into());
        write_entry(store.as_ref(), &done, Segment::Info).await.unwrap();
        let mut open = IndexEntry::base("open.txt", "b0");
        open.remote_sha = Some("r2".into());
        write_entry(store.as_ref(), &open, Segment::Info).await.unwrap();

        assert!(conflicts.are_all_resolved(&["done.txt".to_string()]).await.unwrap());
        assert!(!conflicts
            .are_all_resolved(&["done.txt".to_string(), "open.txt".to_string()])
            .await
            .unwrap());
        assert!(!conflicts.are_all_resolved(&["missing.txt".to_string()]).await.unwrap());
        // A clean entry has no remote_sha at all.
        write_entry(store.as_ref(), &IndexEntry::base("clean.txt", "b"), Segment::Info)
            .await
            .unwrap();
        assert!(!conflicts.are_all_resolved(&["clean.txt".to_string()]).await.unwrap());
    }

    #[tokio::test]
    async fn promote_prefers_snapshot_content() {
        let (store, _index, conflicts) = setup();
        let mut entry = IndexEntry::base("a.txt", "r1");
        entry.state = EntryState::Conflict;
        entry.remote_sha = Some("r1".into());
        write_entry(store.as_ref(), &entry, Segment::Info).await.unwrap();
        store.write_blob("a.txt", "parked", Segment::Conflict).await.unwrap();

        let snapshot = BTreeMap::from([("a.txt".to_string(), "snap".to_string())]);
        conflicts
            .promote_resolved_conflict_entry("a.txt", Some(&snapshot))
            .await
            .unwrap();
        assert_eq!(
            store.read_blob("a.txt", Some(Segment::Base)).await.unwrap().as_deref(),
            Some("snap")
        );
        assert!(conflicts.read_conflict("a.txt").await.unwrap().is_none());

        let entry = info(&store, "a.txt").await.unwrap();
        assert_eq!(entry.state, EntryState::Base);
        assert!(entry.remote_sha.is_none());
    }

    #[tokio::test]
    async fn promote_batch_is_noop_unless_all_resolved() {
        let (store, index, conflicts) = setup();
        index.set_head("H1");
        let mut open = IndexEntry::base("a.txt", "b0");
        open.state = EntryState::Conflict;
        open.remote_sha = Some("r1".into());
        write_entry(store.as_ref(), &open, Segment::Info).await.unwrap();

        let paths = vec!["a.txt".to_string()];
        assert!(!conflicts.promote_resolved_conflicts(&paths, None, "H2").await.unwrap());
        assert_eq!(index.head(), "H1");
        assert!(info(&store, "a.txt").await.unwrap().is_conflict());

        let mut done = open.clone();
        done.base_sha = Some("r1".into());
        write_entry(store.as_ref(), &done, Segment::Info).await.unwrap();
        assert!(conflicts.promote_resolved_conflicts(&paths, None, "H2").await.unwrap());
        assert_eq!(index.head(), "H2");
        assert!(!info(&store, "a.txt").await.unwrap().is_conflict());
    }

    #[tokio::test]
    async fn withdrawing_keeps_local_edit_as_modified() {
        let (store, _index, conflicts) = setup();
        conflicted(&store, &conflicts, "a.txt", "theirs").await;
        let entry = info(&store, "a.txt").await.unwrap();

        let entry = conflicts.withdraw_conflict(entry).await.unwrap();
        assert_eq!(entry.state, EntryState::Modified);
        assert!(entry.remote_sha.is_none());

        let stored = info(&store, "a.txt").await.unwrap();
        assert_eq!(stored.state, EntryState::Modified);
        assert_eq!(stored.base_sha.as_deref(), Some("b0"));
        assert_eq!(stored.workspace_sha.as_deref(), Some("w1"));
        assert!(stored.remote_sha.is_none());
        assert!(conflicts.read_conflict("a.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn withdrawing_without_edit_leaves_tombstone() {
        let (store, _index, conflicts) = setup();
        let tombstone = IndexEntry::tombstone("a.txt", Some("b0".into()));
        let entry = conflicts
            .set_index_entry_to_conflict("a.txt", tombstone, "r1")
            .await
            .unwrap();

        let entry = conflicts.withdraw_conflict(entry).await.unwrap();
        assert!(entry.is_tombstone());
        assert!(info(&store, "a.txt").await.unwrap().remote_sha.is_none());
    }

    #[tokio::test]
    async fn promote_empty_batch_does_nothing() {
        let (_store, index, conflicts) = setup();
        index.set_head("H1");
        assert!(!conflicts.promote_resolved_conflicts(&[], None, "H2").await.unwrap());
        assert_eq!(index.head(), "H1");
    }
}
