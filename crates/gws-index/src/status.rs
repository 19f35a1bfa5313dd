//! Working directory status types.
//!
//! A status is the change set grouped by kind, plus the paths currently in
//! conflict with a remote version.

use gws_types::Change;
use serde::{Deserialize, Serialize};

/// Summary of pending local work.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkdirStatus {
    /// Paths that would be pushed as creates.
    pub added: Vec<String>,
    /// Paths that would be pushed as updates.
    pub modified: Vec<String>,
    /// Paths that would be pushed as deletes.
    pub deleted: Vec<String>,
    /// Paths awaiting conflict resolution.
    pub conflicts: Vec<String>,
}

impl WorkdirStatus {
    /// Create an empty status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Group a change set by kind.
    pub fn from_changes(changes: &[Change], conflicts: Vec<String>) -> Self {
        let mut status = Self {
            conflicts,
            ..Self::default()
        };
        for change in changes {
            let path = change.path().to_string();
            match change {
                Change::Create { .. } => status.added.push(path),
                Change::Update { .. } => status.modified.push(path),
                Change::Delete { .. } => status.deleted.push(path),
            }
        }
        status
    }

    /// Returns `true` if there is nothing to push and nothing to resolve.
    pub fn is_clean(&self) -> bool {
        self.added.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
            && self.conflicts.is_empty()
    }

    /// Returns `true` if there are any conflicts.
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Total number of entries across all categories.
    pub fn total_entries(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len() + self.conflicts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_status_is_clean() {
        let status = WorkdirStatus::new();
        assert!(status.is_clean());
        assert!(!status.has_conflicts());
        assert_eq!(status.total_entries(), 0);
    }

    #[test]
    fn groups_changes_by_kind() {
        let changes = vec![
            Change::create("new.txt", "n"),
            Change::update("edit.txt", "e", Some("b1".into())),
            Change::delete("gone.txt", "b2"),
        ];
        let status = WorkdirStatus::from_changes(&changes, vec!["c.txt".into()]);
        assert_eq!(status.added, vec!["new.txt"]);
        assert_eq!(status.modified, vec!["edit.txt"]);
        assert_eq!(status.deleted, vec!["gone.txt"]);
        assert!(status.has_conflicts());
        assert!(!status.is_clean());
        assert_eq!(status.total_entries(), 4);
    }
}
