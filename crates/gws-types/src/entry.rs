//! Per-path index entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Lifecycle state of a tracked path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    /// In sync with the last known remote content.
    #[default]
    Base,
    /// Edited locally on top of a synced base.
    Modified,
    /// Created locally, never synced.
    Added,
    /// Tombstone: deleted locally, deletion not yet pushed.
    Deleted,
    /// Local and remote diverged; a remote version awaits resolution.
    Conflict,
}

/// Metadata for one path, persisted as JSON in the `info` segments.
///
/// `remote_sha` is present iff `state == Conflict`. A `Deleted` entry is a
/// tombstone carrying only `base_sha`.
///
/// Records may be partial: a missing `path` is filled in from the key the
/// record is stored under, a missing `state` reads as `base`, and a missing
/// `updatedAt` as the epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub state: EntryState,
    /// Hash of the last synced content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_sha: Option<String>,
    /// Hash of the remote content currently in conflict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_sha: Option<String>,
    /// Hash of the uncommitted local edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_sha: Option<String>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl IndexEntry {
    /// An entry in sync with remote content `base_sha`.
    pub fn base(path: impl Into<String>, base_sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: EntryState::Base,
            base_sha: Some(base_sha.into()),
            remote_sha: None,
            workspace_sha: None,
            updated_at: Utc::now(),
        }
    }

    /// A locally created entry that has never been synced.
    pub fn added(path: impl Into<String>, workspace_sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: EntryState::Added,
            base_sha: None,
            remote_sha: None,
            workspace_sha: Some(workspace_sha.into()),
            updated_at: Utc::now(),
        }
    }

    /// A tombstone: a deleted path remembering only its last synced hash.
    pub fn tombstone(path: impl Into<String>, base_sha: Option<String>) -> Self {
        Self {
            path: path.into(),
            state: EntryState::Deleted,
            base_sha,
            remote_sha: None,
            workspace_sha: None,
            updated_at: Utc::now(),
        }
    }

    /// A tombstone derived from this entry: only `base_sha` survives.
    pub fn to_tombstone(&self) -> Self {
        Self::tombstone(self.path.clone(), self.base_sha.clone())
    }

    /// Refresh `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn is_conflict(&self) -> bool {
        self.state == EntryState::Conflict
    }

    pub fn is_tombstone(&self) -> bool {
        self.state == EntryState::Deleted
    }

    /// Parse a serialized `info` record.
    pub fn from_json(text: &str) -> Result<Self, TypeError> {
        serde_json::from_str(text).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Serialize for an `info` record.
    pub fn to_json(&self) -> Result<String, TypeError> {
        serde_json::to_string(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_entry_has_no_remote_sha() {
        let entry = IndexEntry::base("a.txt", "b1");
        assert_eq!(entry.state, EntryState::Base);
        assert_eq!(entry.base_sha.as_deref(), Some("b1"));
        assert!(entry.remote_sha.is_none());
        assert!(!entry.is_conflict());
    }

    #[test]
    fn tombstone_keeps_only_base_sha() {
        let mut entry = IndexEntry::base("a.txt", "b1");
        entry.workspace_sha = Some("w1".into());
        entry.state = EntryState::Modified;

        let tomb = entry.to_tombstone();
        assert!(tomb.is_tombstone());
        assert_eq!(tomb.base_sha.as_deref(), Some("b1"));
        assert!(tomb.workspace_sha.is_none());
        assert!(tomb.remote_sha.is_none());
    }

    #[test]
    fn json_is_camel_case() {
        let mut entry = IndexEntry::base("a.txt", "b1");
        entry.workspace_sha = Some("w1".into());
        let json = entry.to_json().unwrap();
        assert!(json.contains("\"baseSha\":\"b1\""));
        assert!(json.contains("\"workspaceSha\":\"w1\""));
        assert!(json.contains("\"state\":\"base\""));
        assert!(!json.contains("remoteSha"));
    }

    #[test]
    fn parses_minimal_record() {
        let entry = IndexEntry::from_json(
            r#"{"path":"a.txt","state":"deleted","baseSha":"b1","updatedAt":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(entry.is_tombstone());
        assert_eq!(entry.base_sha.as_deref(), Some("b1"));
    }

    #[test]
    fn parses_partial_record() {
        let entry = IndexEntry::from_json(r#"{"baseSha":"b1"}"#).unwrap();
        assert_eq!(entry.state, EntryState::Base);
        assert_eq!(entry.base_sha.as_deref(), Some("b1"));
        assert!(entry.path.is_empty());
        assert_eq!(entry.updated_at, DateTime::<Utc>::default());
    }

    #[test]
    fn garbage_is_a_serialization_error() {
        let err = IndexEntry::from_json("{not json").unwrap_err();
        assert!(matches!(err, TypeError::Serialization(_)));
    }
}
