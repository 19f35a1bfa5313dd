use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use gws_types::{Change, HashScheme};
use serde::{Deserialize, Serialize};

use crate::transport::SnapshotContent;

/// The full remote tree at one head, as hashes.
#[derive(Clone)]
pub struct RemoteSnapshot {
    pub head_sha: String,
    /// Path to content hash.
    pub shas: BTreeMap<String, String>,
    /// Scheme the remote used to compute `shas`.
    pub scheme: HashScheme,
    /// Optional bulk content fetch for this tree.
    pub content: Option<Arc<dyn SnapshotContent>>,
}

impl RemoteSnapshot {
    pub fn new(head_sha: impl Into<String>, shas: BTreeMap<String, String>) -> Self {
        Self {
            head_sha: head_sha.into(),
            shas,
            scheme: HashScheme::default(),
            content: None,
        }
    }

    pub fn with_scheme(mut self, scheme: HashScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_content(mut self, content: Arc<dyn SnapshotContent>) -> Self {
        self.content = Some(content);
        self
    }
}

impl fmt::Debug for RemoteSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSnapshot")
            .field("head_sha", &self.head_sha)
            .field("paths", &self.shas.len())
            .field("scheme", &self.scheme)
            .field("has_content", &self.content.is_some())
            .finish()
    }
}

/// What a caller may hand to pull.
#[derive(Clone, Debug)]
pub enum RemoteInput {
    Descriptor(RemoteSnapshot),
    /// A bare head, optionally with the full tree as path to content.
    Head {
        head_sha: String,
        snapshot: Option<BTreeMap<String, String>>,
    },
}

impl From<RemoteSnapshot> for RemoteInput {
    fn from(snapshot: RemoteSnapshot) -> Self {
        Self::Descriptor(snapshot)
    }
}

impl From<&str> for RemoteInput {
    fn from(head_sha: &str) -> Self {
        Self::Head {
            head_sha: head_sha.to_string(),
            snapshot: None,
        }
    }
}

impl From<(&str, BTreeMap<String, String>)> for RemoteInput {
    fn from((head_sha, snapshot): (&str, BTreeMap<String, String>)) -> Self {
        Self::Head {
            head_sha: head_sha.to_string(),
            snapshot: Some(snapshot),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// Both sides changed the content.
    Modified,
    /// Deleted remotely, changed locally.
    Deleted,
}

/// A path awaiting caller-driven resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDescriptor {
    pub path: String,
    pub kind: ConflictKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_sha: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResult {
    pub conflicts: Vec<ConflictDescriptor>,
    /// Paths whose conflict content was fetched during this pull.
    pub fetched_paths: Vec<String>,
    /// Paths reconciled in place without a conflict.
    pub reconciled_paths: Vec<String>,
}

impl PullResult {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn conflict_paths(&self) -> Vec<String> {
        self.conflicts.iter().map(|c| c.path.clone()).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushInput {
    pub parent_sha: Option<String>,
    pub changes: Vec<Change>,
    /// Idempotency key; derived from parent and changes when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_key: Option<String>,
}

impl PushInput {
    pub fn new(parent_sha: impl Into<String>, changes: Vec<Change>) -> Self {
        Self {
            parent_sha: Some(parent_sha.into()),
            changes,
            commit_key: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResult {
    pub commit_sha: String,
}
