use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A named partition of the content store for a given path.
///
/// Several logical versions of the same path coexist by living in different
/// segments: the uncommitted local edit, the last synced content, the remote
/// content pending resolution, and the serialized metadata records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    /// Uncommitted local edits.
    #[serde(rename = "workspace")]
    Workspace,
    /// Last-known-synced content.
    #[serde(rename = "base")]
    Base,
    /// Remote content pending resolution.
    #[serde(rename = "conflict")]
    Conflict,
    /// Raw remote blob pending resolution.
    #[serde(rename = "conflictBlob")]
    ConflictBlob,
    /// Primary per-path metadata record.
    #[serde(rename = "info")]
    Info,
    /// Workspace-scoped metadata copy.
    #[serde(rename = "info-workspace")]
    InfoWorkspace,
    /// Remote-scoped metadata copy.
    #[serde(rename = "info-git")]
    InfoGit,
}

impl Segment {
    /// Probe order for a read that does not name a segment.
    pub const READ_FALLBACK: [Segment; 3] = [Segment::Workspace, Segment::Base, Segment::Conflict];

    /// Segments cleared by a delete that does not name a segment.
    pub const CONTENT: [Segment; 4] = [
        Segment::Workspace,
        Segment::Base,
        Segment::Conflict,
        Segment::ConflictBlob,
    ];

    /// All metadata segments.
    pub const METADATA: [Segment; 3] = [Segment::Info, Segment::InfoWorkspace, Segment::InfoGit];

    /// Wire name of the segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Workspace => "workspace",
            Segment::Base => "base",
            Segment::Conflict => "conflict",
            Segment::ConflictBlob => "conflictBlob",
            Segment::Info => "info",
            Segment::InfoWorkspace => "info-workspace",
            Segment::InfoGit => "info-git",
        }
    }

    /// Returns `true` for segments holding serialized [`IndexEntry`](crate::IndexEntry) records.
    pub fn is_metadata(&self) -> bool {
        matches!(self, Segment::Info | Segment::InfoWorkspace | Segment::InfoGit)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Segment {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workspace" => Ok(Segment::Workspace),
            "base" => Ok(Segment::Base),
            "conflict" => Ok(Segment::Conflict),
            "conflictBlob" => Ok(Segment::ConflictBlob),
            "info" => Ok(Segment::Info),
            "info-workspace" => Ok(Segment::InfoWorkspace),
            "info-git" => Ok(Segment::InfoGit),
            other => Err(TypeError::UnknownSegment(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_parse_back() {
        for segment in Segment::CONTENT.iter().chain(Segment::METADATA.iter()) {
            let parsed: Segment = segment.as_str().parse().unwrap();
            assert_eq!(parsed, *segment);
        }
    }

    #[test]
    fn unknown_segment_is_rejected() {
        let err = "scratch".parse::<Segment>().unwrap_err();
        assert_eq!(err, TypeError::UnknownSegment("scratch".into()));
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Segment::ConflictBlob).unwrap();
        assert_eq!(json, "\"conflictBlob\"");
        let json = serde_json::to_string(&Segment::InfoGit).unwrap();
        assert_eq!(json, "\"info-git\"");
    }

    #[test]
    fn metadata_segments_are_flagged() {
        assert!(Segment::Info.is_metadata());
        assert!(Segment::InfoWorkspace.is_metadata());
        assert!(!Segment::Base.is_metadata());
        assert!(!Segment::Workspace.is_metadata());
    }
}
