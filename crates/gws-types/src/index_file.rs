//! The singleton repository index record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entry::IndexEntry;

/// Repository-wide record: the reconciled remote `head`, the idempotency key
/// of the last pushed commit, and opaque hosting metadata.
///
/// Per-path `info` records are the source of truth for entries; `entries`
/// here is an aggregate view that older records may carry. Unknown top-level
/// fields are kept in `extra` so a save never drops them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    #[serde(default)]
    pub head: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub entries: BTreeMap<String, IndexEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IndexFile {
    /// A record pointing at `head` with nothing else set.
    pub fn with_head(head: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            ..Self::default()
        }
    }

    /// Returns `true` if the repository has never reconciled with a remote.
    pub fn is_unborn(&self) -> bool {
        self.head.is_empty()
    }
}
