use serde::{Deserialize, Serialize};

/// A pending local change, produced by diffing and consumed by push/apply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Change {
    Create {
        path: String,
        content: String,
    },
    Update {
        path: String,
        content: String,
        #[serde(rename = "baseSha", default, skip_serializing_if = "Option::is_none")]
        base_sha: Option<String>,
    },
    Delete {
        path: String,
        #[serde(rename = "baseSha")]
        base_sha: String,
    },
}

/// Discriminant of a [`Change`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl Change {
    pub fn create(path: impl Into<String>, content: impl Into<String>) -> Self {
        Change::Create {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn update(
        path: impl Into<String>,
        content: impl Into<String>,
        base_sha: Option<String>,
    ) -> Self {
        Change::Update {
            path: path.into(),
            content: content.into(),
            base_sha,
        }
    }

    pub fn delete(path: impl Into<String>, base_sha: impl Into<String>) -> Self {
        Change::Delete {
            path: path.into(),
            base_sha: base_sha.into(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Change::Create { path, .. } | Change::Update { path, .. } | Change::Delete { path, .. } => {
                path
            }
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::Create { .. } => ChangeKind::Create,
            Change::Update { .. } => ChangeKind::Update,
            Change::Delete { .. } => ChangeKind::Delete,
        }
    }

    /// New content for creates and updates; `None` for deletes.
    pub fn content(&self) -> Option<&str> {
        match self {
            Change::Create { content, .. } | Change::Update { content, .. } => Some(content),
            Change::Delete { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let c = Change::update("a.txt", "new", Some("b1".into()));
        assert_eq!(c.path(), "a.txt");
        assert_eq!(c.kind(), ChangeKind::Update);
        assert_eq!(c.content(), Some("new"));

        let d = Change::delete("gone.txt", "b2");
        assert_eq!(d.kind(), ChangeKind::Delete);
        assert!(d.content().is_none());
    }

    #[test]
    fn serialized_shape_is_tagged() {
        let json = serde_json::to_value(Change::delete("a.txt", "b1")).unwrap();
        assert_eq!(json["type"], "delete");
        assert_eq!(json["path"], "a.txt");
        assert_eq!(json["baseSha"], "b1");

        let json = serde_json::to_value(Change::create("n.txt", "hello")).unwrap();
        assert_eq!(json["type"], "create");
        assert_eq!(json["content"], "hello");
    }
}
