//! Pending change detection.
//!
//! The change set is the union of three disjoint classifications:
//!
//! 1. index-driven deletes: tracked paths whose workspace copy is gone,
//! 2. tombstone-driven deletes: an extension point, currently empty,
//! 3. workspace-driven creates and updates.

use std::collections::BTreeSet;
use std::sync::Arc;

use gws_store::ContentStore;
use gws_types::{Change, EntryState, IndexEntry, Segment};
use tracing::debug;

use crate::error::IndexResult;
use crate::metadata::parse_info;
use crate::status::WorkdirStatus;

/// Computes pending local changes by diffing the workspace segment against
/// per-path metadata.
pub struct ChangeTracker {
    store: Arc<dyn ContentStore>,
}

impl ChangeTracker {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// All pending changes.
    pub async fn change_set(&self) -> IndexResult<Vec<Change>> {
        let mut changes = self.index_deletes().await?;
        let covered: BTreeSet<String> = changes.iter().map(|c| c.path().to_string()).collect();
        changes.extend(self.tombstone_deletes(&covered));
        changes.extend(self.workspace_changes().await?);
        debug!(count = changes.len(), "change set computed");
        Ok(changes)
    }

    /// Pending changes grouped by kind, plus conflicted paths.
    pub async fn status(&self) -> IndexResult<WorkdirStatus> {
        let changes = self.change_set().await?;
        let conflicts = self
            .store
            .list_files("", Segment::Info, true)
            .await?
            .into_iter()
            .filter(|f| {
                f.info
                    .as_deref()
                    .and_then(|t| parse_info(&f.path, t))
                    .is_some_and(|e| e.is_conflict())
            })
            .map(|f| f.path)
            .collect();
        Ok(WorkdirStatus::from_changes(&changes, conflicts))
    }

    /// Tracked paths with a `baseSha` whose workspace copy is absent.
    ///
    /// `deleted` and `modified` entries always count. Any other entry is
    /// spared only while it is still readable through its base content, or
    /// while an `info-git` record marks it as pulled and awaiting hydration.
    async fn index_deletes(&self) -> IndexResult<Vec<Change>> {
        let mut deletes = Vec::new();
        for file in self.store.list_files("", Segment::Info, true).await? {
            let Some(entry) = file.info.as_deref().and_then(|t| parse_info(&file.path, t)) else {
                continue;
            };
            let Some(base_sha) = entry.base_sha.as_deref() else {
                continue;
            };
            let path = file.path.as_str();
            if self.store.read_blob(path, Some(Segment::Workspace)).await?.is_some() {
                continue;
            }
            let local_intent = matches!(entry.state, EntryState::Deleted | EntryState::Modified);
            if !local_intent && self.still_readable(path).await? {
                continue;
            }
            deletes.push(Change::delete(path, base_sha));
        }
        Ok(deletes)
    }

    async fn still_readable(&self, path: &str) -> IndexResult<bool> {
        if self.store.read_blob(path, Some(Segment::Base)).await?.is_some() {
            return Ok(true);
        }
        Ok(self.store.read_blob(path, Some(Segment::InfoGit)).await?.is_some())
    }

    /// Explicitly tombstoned paths not already covered by `covered`.
    ///
    /// Tombstones currently surface through [`index_deletes`](Self::index_deletes);
    /// a tombstone store kept apart from `info` records would report here.
    fn tombstone_deletes(&self, _covered: &BTreeSet<String>) -> Vec<Change> {
        Vec::new()
    }

    async fn workspace_changes(&self) -> IndexResult<Vec<Change>> {
        let mut changes = Vec::new();
        for file in self.store.list_files("", Segment::Workspace, true).await? {
            let content = self
                .store
                .read_blob(&file.path, Some(Segment::Workspace))
                .await?;
            let entry = match file.info.as_deref() {
                None => None,
                Some(text) => match parse_info(&file.path, text) {
                    Some(entry) => Some(entry),
                    None => continue,
                },
            };
            if let Some(change) = classify(&file.path, entry.as_ref(), content) {
                changes.push(change);
            }
        }
        Ok(changes)
    }
}

fn classify(path: &str, entry: Option<&IndexEntry>, content: Option<String>) -> Option<Change> {
    let content = content?;
    let Some(entry) = entry else {
        // Untracked: never written through the file manager.
        return Some(Change::create(path, content));
    };
    if entry.state == EntryState::Added {
        return Some(Change::create(path, content));
    }
    let considered = matches!(entry.state, EntryState::Modified | EntryState::Conflict)
        || entry.workspace_sha.is_some();
    if !considered {
        return None;
    }
    match &entry.base_sha {
        Some(base_sha) => Some(Change::update(path, content, Some(base_sha.clone()))),
        None => Some(Change::create(path, content)),
    }
}
