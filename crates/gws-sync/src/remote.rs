//! Pull, push, bulk reset, and lazy hydration.

use std::collections::BTreeMap;
use std::sync::Arc;

use gws_index::metadata::{parse_info, read_entry, write_entry, write_synced_entry};
use gws_index::{IndexManager, LocalChangeApplier};
use gws_merge::ConflictManager;
use gws_store::ContentStore;
use gws_types::{commit_key, commit_sha, EntryState, HashScheme, IndexEntry, Segment};
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::transport::RemoteContentSource;
use crate::types::{
    ConflictDescriptor, ConflictKind, PullResult, PushInput, PushResult, RemoteInput, RemoteSnapshot,
};

/// Top-level synchronization protocol for one repository instance.
///
/// Assumes a single writer: concurrent `pull`/`push` calls on the same
/// instance are not serialized here.
pub struct RemoteSynchronizer {
    store: Arc<dyn ContentStore>,
    index: Arc<IndexManager>,
    conflicts: Arc<ConflictManager>,
    applier: LocalChangeApplier,
    scheme: HashScheme,
}

/// Outcome of classifying one remote path.
enum PathOutcome {
    Unchanged,
    Reconciled,
    /// Reconciled in place while still recorded as a conflict.
    ReconciledConflict(ConflictDescriptor),
    Updated,
    Conflict(ConflictDescriptor),
}

impl RemoteSynchronizer {
    /// `scheme` hashes local content (workspace edits, committed changes).
    pub fn new(
        store: Arc<dyn ContentStore>,
        index: Arc<IndexManager>,
        conflicts: Arc<ConflictManager>,
        scheme: HashScheme,
    ) -> Self {
        let applier = LocalChangeApplier::new(store.clone(), scheme);
        Self {
            store,
            index,
            conflicts,
            applier,
            scheme,
        }
    }

    /// Reconcile local state against a remote tree without fetching content
    /// for non-conflicted paths.
    ///
    /// `base_snapshot` (path to content) is written to `base` where it covers
    /// an updated path, and supplies conflict content. A bare head with a
    /// `base_snapshot` reconciles against that snapshot as the remote tree.
    pub async fn pull(
        &self,
        remote: impl Into<RemoteInput>,
        base_snapshot: Option<&BTreeMap<String, String>>,
    ) -> SyncResult<PullResult> {
        let (remote, shorthand) = match remote.into() {
            RemoteInput::Descriptor(snapshot) => (snapshot, None),
            RemoteInput::Head { head_sha, snapshot } => {
                let Some(contents) = snapshot.or_else(|| base_snapshot.cloned()) else {
                    // No tree to reconcile against.
                    self.index.set_head(head_sha.as_str());
                    self.index.save().await?;
                    info!(head = %head_sha, "head-only pull");
                    return Ok(PullResult::default());
                };
                let shas = contents
                    .iter()
                    .map(|(path, content)| (path.clone(), HashScheme::GitBlob.hash_str(content)))
                    .collect();
                (RemoteSnapshot::new(head_sha, shas), Some(contents))
            }
        };
        let base_snapshot = base_snapshot.or(shorthand.as_ref());

        let mut result = PullResult::default();
        let mut updated = 0usize;
        for (path, remote_sha) in &remote.shas {
            match self.reconcile_path(path, remote_sha, &remote, base_snapshot).await? {
                PathOutcome::Unchanged => {}
                PathOutcome::Reconciled => result.reconciled_paths.push(path.clone()),
                PathOutcome::ReconciledConflict(conflict) => {
                    result.reconciled_paths.push(path.clone());
                    result.conflicts.push(conflict);
                }
                PathOutcome::Updated => updated += 1,
                PathOutcome::Conflict(conflict) => result.conflicts.push(conflict),
            }
        }

        result.fetched_paths = self.fetch_conflict_content(&remote, &result).await;
        result.conflicts.extend(self.reconcile_removed(&remote).await?);

        if result.conflicts.is_empty() {
            self.index.set_head(remote.head_sha.as_str());
            self.index.save().await?;
            info!(
                head = %remote.head_sha,
                updated,
                reconciled = result.reconciled_paths.len(),
                "pull fast-forwarded"
            );
            return Ok(result);
        }

        let promoted = self
            .conflicts
            .promote_resolved_conflicts(&result.conflict_paths(), base_snapshot, &remote.head_sha)
            .await?;
        if !promoted && !result.reconciled_paths.is_empty() {
            self.index.save().await?;
        }
        info!(
            head = %remote.head_sha,
            conflicts = result.conflicts.len(),
            promoted,
            "pull produced conflicts"
        );
        Ok(result)
    }

    async fn reconcile_path(
        &self,
        path: &str,
        remote_sha: &str,
        remote: &RemoteSnapshot,
        base_snapshot: Option<&BTreeMap<String, String>>,
    ) -> SyncResult<PathOutcome> {
        let store = self.store.as_ref();
        let entry = read_entry(store, path, Segment::Info).await?;
        if let Some(entry) = entry.as_ref().filter(|e| e.base_sha.as_deref() == Some(remote_sha)) {
            if !entry.is_conflict() {
                return Ok(PathOutcome::Unchanged);
            }
            // The remote is back at our base; only the local side differs.
            self.conflicts.withdraw_conflict(entry.clone()).await?;
            return Ok(PathOutcome::Reconciled);
        }

        // Same bytes, different addressing: adopt the remote hash in place.
        if let Some(base) = store.read_blob(path, Some(Segment::Base)).await? {
            if remote.scheme.hash_str(&base) == remote_sha {
                let mut entry = entry.unwrap_or_else(|| IndexEntry::base(path, remote_sha));
                entry.base_sha = Some(remote_sha.to_string());
                entry.touch();
                write_synced_entry(store, &entry).await?;
                debug!(path, remote_sha, "base reconciled in place");
                if entry.is_conflict() {
                    return Ok(PathOutcome::ReconciledConflict(ConflictDescriptor {
                        path: path.to_string(),
                        kind: ConflictKind::Modified,
                        remote_sha: entry.remote_sha,
                        workspace_sha: entry.workspace_sha,
                        base_sha: entry.base_sha,
                    }));
                }
                return Ok(PathOutcome::Reconciled);
            }
        }

        let workspace = store.read_blob(path, Some(Segment::Workspace)).await?;
        if let Some(content) = workspace.as_deref() {
            if remote.scheme.hash_str(content) == remote_sha {
                self.adopt_workspace(path, content, remote_sha).await?;
                return Ok(PathOutcome::Reconciled);
            }
        }
        let workspace_sha = workspace.as_deref().map(|w| self.scheme.hash_str(w));

        let Some(entry) = entry else {
            if workspace.is_none() {
                self.write_remote_base(path, remote_sha, base_snapshot).await?;
                return Ok(PathOutcome::Updated);
            }
            let entry = IndexEntry::added(path, workspace_sha.clone().unwrap_or_default());
            let conflict = self
                .mark_conflict(path, entry, remote_sha, workspace_sha, base_snapshot)
                .await?;
            return Ok(PathOutcome::Conflict(conflict));
        };

        if entry.is_conflict() && entry.remote_sha.as_deref() == Some(remote_sha) {
            return Ok(PathOutcome::Conflict(ConflictDescriptor {
                path: path.to_string(),
                kind: ConflictKind::Modified,
                remote_sha: entry.remote_sha.clone(),
                workspace_sha,
                base_sha: entry.base_sha.clone(),
            }));
        }

        let diverged = match &workspace_sha {
            _ if entry.is_conflict() => true,
            None => entry.is_tombstone(),
            Some(sha) => entry.base_sha.as_deref() != Some(sha.as_str()),
        };
        if !diverged {
            if workspace.is_some() {
                store.delete_blob(path, Some(Segment::Workspace)).await?;
                store.delete_blob(path, Some(Segment::InfoWorkspace)).await?;
            }
            store.delete_blob(path, Some(Segment::Base)).await?;
            self.write_remote_base(path, remote_sha, base_snapshot).await?;
            return Ok(PathOutcome::Updated);
        }

        let conflict = self
            .mark_conflict(path, entry, remote_sha, workspace_sha, base_snapshot)
            .await?;
        Ok(PathOutcome::Conflict(conflict))
    }

    /// Record remote `remote_sha` as the clean base of `path`; content only
    /// when the snapshot already carries it.
    async fn write_remote_base(
        &self,
        path: &str,
        remote_sha: &str,
        base_snapshot: Option<&BTreeMap<String, String>>,
    ) -> SyncResult<()> {
        if let Some(content) = base_snapshot.and_then(|s| s.get(path)) {
            self.store.write_blob(path, content, Segment::Base).await?;
        }
        write_synced_entry(self.store.as_ref(), &IndexEntry::base(path, remote_sha)).await?;
        debug!(path, remote_sha, "metadata updated from remote");
        Ok(())
    }

    /// The local edit already matches the remote: it becomes the base.
    async fn adopt_workspace(&self, path: &str, content: &str, remote_sha: &str) -> SyncResult<()> {
        self.applier.apply_create_or_update(path, content).await?;
        self.store.delete_blob(path, Some(Segment::InfoWorkspace)).await?;
        write_synced_entry(self.store.as_ref(), &IndexEntry::base(path, remote_sha)).await?;
        debug!(path, remote_sha, "workspace edit matches remote");
        Ok(())
    }

    async fn mark_conflict(
        &self,
        path: &str,
        entry: IndexEntry,
        remote_sha: &str,
        workspace_sha: Option<String>,
        base_snapshot: Option<&BTreeMap<String, String>>,
    ) -> SyncResult<ConflictDescriptor> {
        let content = base_snapshot.and_then(|s| s.get(path)).map(String::as_str);
        self.conflicts.persist_remote_content_as_conflict(path, content).await;
        let entry = self
            .conflicts
            .set_index_entry_to_conflict(path, entry, remote_sha)
            .await?;
        write_entry(self.store.as_ref(), &entry, Segment::InfoGit).await?;
        warn!(path, remote_sha, "conflict detected");
        Ok(ConflictDescriptor {
            path: path.to_string(),
            kind: ConflictKind::Modified,
            remote_sha: Some(remote_sha.to_string()),
            workspace_sha,
            base_sha: entry.base_sha,
        })
    }

    /// Fetch, in one batch, content for conflicts whose slot is still empty.
    async fn fetch_conflict_content(
        &self,
        remote: &RemoteSnapshot,
        result: &PullResult,
    ) -> Vec<String> {
        let Some(source) = &remote.content else {
            return Vec::new();
        };
        let mut missing = Vec::new();
        for path in result.conflict_paths() {
            match self.conflicts.read_conflict(&path).await {
                Ok(Some(_)) => {}
                Ok(None) => missing.push(path),
                Err(e) => {
                    debug!(path = %path, error = %e, "conflict slot unreadable");
                    missing.push(path);
                }
            }
        }
        if missing.is_empty() {
            return Vec::new();
        }

        let fetched = match source.fetch_content(&missing).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(count = missing.len(), error = %e, "conflict content fetch failed");
                return Vec::new();
            }
        };
        let mut paths = Vec::new();
        for path in &missing {
            let Some(content) = fetched.get(path) else {
                continue;
            };
            if self
                .conflicts
                .persist_remote_content_as_conflict(path, Some(content))
                .await
            {
                paths.push(path.clone());
            }
        }
        paths
    }

    /// Handle locally known paths missing from the remote tree.
    async fn reconcile_removed(&self, remote: &RemoteSnapshot) -> SyncResult<Vec<ConflictDescriptor>> {
        let mut conflicts = Vec::new();
        for file in self.store.list_files("", Segment::Info, true).await? {
            if remote.shas.contains_key(&file.path) {
                continue;
            }
            let Some(entry) = file.info.as_deref().and_then(|t| parse_info(&file.path, t)) else {
                continue;
            };
            // Never synced: nothing remote to agree or disagree with.
            let Some(base_sha) = entry.base_sha.clone() else {
                continue;
            };

            let workspace = self
                .store
                .read_blob(&file.path, Some(Segment::Workspace))
                .await?;
            let workspace_sha = workspace.as_deref().map(|w| self.scheme.hash_str(w));
            let diverged = matches!(entry.state, EntryState::Modified | EntryState::Conflict)
                || workspace_sha.as_deref().is_some_and(|sha| sha != base_sha);

            if diverged {
                debug!(path = %file.path, "deleted remotely, changed locally");
                conflicts.push(ConflictDescriptor {
                    path: file.path,
                    kind: ConflictKind::Deleted,
                    remote_sha: None,
                    workspace_sha,
                    base_sha: Some(base_sha),
                });
            } else {
                self.applier.apply_delete(&file.path).await?;
                debug!(path = %file.path, "removed after remote delete");
            }
        }
        Ok(conflicts)
    }

    /// Commit `input.changes` on top of `input.parent_sha`.
    ///
    /// Succeeds only when the parent is the current head.
    pub async fn push(&self, input: PushInput) -> SyncResult<PushResult> {
        let parent = input.parent_sha.ok_or(SyncError::MissingParent)?;
        let head = self.index.head();
        if parent != head {
            return Err(SyncError::NonFastForward { parent, head });
        }
        if input.changes.is_empty() {
            return Err(SyncError::EmptyChangeSet);
        }
        let key = match input.commit_key {
            Some(key) => key,
            None => commit_key(&parent, &input.changes)?,
        };
        let sha = commit_sha(&parent, &key);

        for change in &input.changes {
            self.applier.apply_change(change).await?;
        }
        self.index.set_head(sha.as_str());
        self.index.set_last_commit_key(Some(key));
        self.index.save().await?;
        info!(parent = %parent, commit = %sha, changes = input.changes.len(), "push committed");
        Ok(PushResult { commit_sha: sha })
    }

    /// Replace the local base tree with `snapshot` (path to content) at
    /// `head_sha`.
    ///
    /// Metadata of paths with pending local work is left alone.
    pub async fn apply_base_snapshot(
        &self,
        snapshot: &BTreeMap<String, String>,
        head_sha: &str,
    ) -> SyncResult<()> {
        let store = self.store.as_ref();
        for (path, content) in snapshot {
            let sha = self.scheme.hash_str(content);
            let entry = read_entry(store, path, Segment::Info).await?;
            if entry.as_ref().and_then(|e| e.base_sha.as_deref()) == Some(sha.as_str()) {
                continue;
            }
            store.write_blob(path, content, Segment::Base).await?;
            let refresh = entry.as_ref().map_or(true, |e| e.state == EntryState::Base);
            if refresh {
                write_synced_entry(store, &IndexEntry::base(path.as_str(), sha)).await?;
            }
        }

        for file in store.list_files("", Segment::Info, true).await? {
            if snapshot.contains_key(&file.path) {
                continue;
            }
            let entry = file.info.as_deref().and_then(|t| parse_info(&file.path, t));
            match entry {
                Some(entry) if entry.state == EntryState::Base => {
                    self.applier.apply_delete(&file.path).await?;
                }
                _ => store.delete_blob(&file.path, Some(Segment::Base)).await?,
            }
        }

        self.index.set_head(head_sha);
        self.index.save().await?;
        info!(head = head_sha, paths = snapshot.len(), "base snapshot applied");
        Ok(())
    }

    /// Base content of `path`, fetched through `source` on first use.
    ///
    /// Errors propagate; see [`fetch_base_if_missing`](Self::fetch_base_if_missing)
    /// for the best-effort form.
    pub async fn try_fetch_base(
        &self,
        path: &str,
        source: Option<&RemoteContentSource>,
    ) -> SyncResult<Option<String>> {
        if let Some(content) = self.store.read_blob(path, Some(Segment::Base)).await? {
            return Ok(Some(content));
        }
        let Some(entry) = read_entry(self.store.as_ref(), path, Segment::Info).await? else {
            return Ok(None);
        };
        let (Some(base_sha), Some(source)) = (entry.base_sha.as_deref(), source) else {
            return Ok(None);
        };
        let content = source.fetch(path, base_sha).await?;
        self.store.write_blob(path, &content, Segment::Base).await?;
        debug!(path, base_sha, "base hydrated");
        Ok(Some(content))
    }

    /// Best-effort lazy hydration: `None` means "not available yet".
    pub async fn fetch_base_if_missing(
        &self,
        path: &str,
        source: Option<&RemoteContentSource>,
    ) -> Option<String> {
        match self.try_fetch_base(path, source).await {
            Ok(content) => content,
            Err(e) => {
                warn!(path, error = %e, "base fetch failed");
                None
            }
        }
    }
}
