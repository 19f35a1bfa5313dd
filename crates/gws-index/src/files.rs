//! Local file operations on a single path.

use std::sync::Arc;

use gws_store::ContentStore;
use gws_types::{EntryState, HashScheme, IndexEntry, Segment};
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::metadata::{purge_entry, read_entry, write_entry};

/// User-facing read/write/delete/rename, with tombstone bookkeeping.
pub struct LocalFileManager {
    store: Arc<dyn ContentStore>,
    scheme: HashScheme,
}

impl LocalFileManager {
    pub fn new(store: Arc<dyn ContentStore>, scheme: HashScheme) -> Self {
        Self { store, scheme }
    }

    /// Overwrite the workspace copy of `path` and refresh its metadata.
    pub async fn write_file(&self, path: &str, content: &str) -> IndexResult<()> {
        if path.is_empty() {
            return Err(IndexError::InvalidPath("empty path".to_string()));
        }
        self.store.write_blob(path, content, Segment::Workspace).await?;

        let sha = self.scheme.hash_str(content);
        let entry = match read_entry(self.store.as_ref(), path, Segment::Info).await? {
            None => IndexEntry::added(path, sha),
            Some(mut entry) => {
                match entry.state {
                    EntryState::Added | EntryState::Conflict => entry.workspace_sha = Some(sha),
                    EntryState::Base | EntryState::Modified | EntryState::Deleted => {
                        if entry.base_sha.as_deref() == Some(sha.as_str()) {
                            entry.state = EntryState::Base;
                            entry.workspace_sha = None;
                        } else {
                            entry.state = EntryState::Modified;
                            entry.workspace_sha = Some(sha);
                        }
                    }
                }
                entry.touch();
                entry
            }
        };
        write_entry(self.store.as_ref(), &entry, Segment::Info).await?;
        write_entry(self.store.as_ref(), &entry, Segment::InfoWorkspace).await?;
        debug!(path, state = ?entry.state, "file written");
        Ok(())
    }

    /// Workspace content if present, else base content.
    pub async fn read_file(&self, path: &str) -> IndexResult<Option<String>> {
        if let Some(content) = self.store.read_blob(path, Some(Segment::Workspace)).await? {
            return Ok(Some(content));
        }
        Ok(self.store.read_blob(path, Some(Segment::Base)).await?)
    }

    /// Remove the workspace copy of `path`.
    ///
    /// A path that was ever synced (recorded `baseSha` or base content) keeps
    /// a `deleted` tombstone so the deletion can be pushed; a purely local
    /// path leaves no trace.
    ///
    /// The tombstone keeps only `baseSha`. Deleting a conflicted path drops
    /// its `remoteSha`, so the next pull sees a tombstone changed remotely
    /// and reports the conflict afresh.
    pub async fn delete_file(&self, path: &str) -> IndexResult<()> {
        let store = self.store.as_ref();
        let base = store.read_blob(path, Some(Segment::Base)).await?;
        let workspace_meta = read_entry(store, path, Segment::InfoWorkspace).await?;
        let git_meta = read_entry(store, path, Segment::InfoGit).await?;
        let primary_meta = read_entry(store, path, Segment::Info).await?;

        store.delete_blob(path, Some(Segment::Workspace)).await?;

        if let Some(conflict) = primary_meta.as_ref().filter(|m| m.is_conflict()) {
            debug!(
                path,
                remote_sha = ?conflict.remote_sha,
                "conflicted file deleted, conflict dropped"
            );
        }

        let meta = workspace_meta.or(git_meta).or(primary_meta);
        let recorded_base = meta.as_ref().and_then(|m| m.base_sha.clone());

        if recorded_base.is_none() && base.is_none() {
            purge_entry(store, path).await?;
            debug!(path, "untracked file deleted");
            return Ok(());
        }

        let base_sha = recorded_base.or_else(|| base.as_deref().map(|b| self.scheme.hash_str(b)));
        let tombstone = IndexEntry::tombstone(path, base_sha);
        write_entry(store, &tombstone, Segment::Info).await?;
        write_entry(store, &tombstone, Segment::InfoWorkspace).await?;
        debug!(path, base_sha = ?tombstone.base_sha, "tombstone written");
        Ok(())
    }

    /// Move `from` to `to` through the workspace.
    pub async fn rename_file(&self, from: &str, to: &str) -> IndexResult<()> {
        let content = self
            .read_file(from)
            .await?
            .ok_or_else(|| IndexError::SourceNotFound(from.to_string()))?;
        self.write_file(to, &content).await?;
        self.delete_file(from).await?;
        debug!(from, to, "file renamed");
        Ok(())
    }
}
