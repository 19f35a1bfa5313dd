//! Remote capabilities consumed on demand.
//!
//! Hosting adapters implement one or more of these traits. The engine never
//! requires them synchronously: pull works from hashes alone, and content is
//! fetched lazily through a [`RemoteContentSource`] chosen by the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Payload encoding of a [`RemoteBlob`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobEncoding {
    Base64,
    #[default]
    #[serde(alias = "utf-8", alias = "utf8")]
    Plain,
}

/// A blob as returned by a hash-addressed fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBlob {
    pub content: String,
    #[serde(default)]
    pub encoding: BlobEncoding,
}

impl RemoteBlob {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            encoding: BlobEncoding::Plain,
        }
    }

    pub fn base64(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            encoding: BlobEncoding::Base64,
        }
    }

    /// Decode the payload to text. Base64 payloads may carry line breaks.
    pub fn decode(&self) -> SyncResult<String> {
        match self.encoding {
            BlobEncoding::Plain => Ok(self.content.clone()),
            BlobEncoding::Base64 => {
                let compact: String = self
                    .content
                    .chars()
                    .filter(|c| *c != '\n' && *c != '\r')
                    .collect();
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(compact)
                    .map_err(|e| SyncError::Decode(e.to_string()))?;
                String::from_utf8(bytes).map_err(|e| SyncError::Decode(e.to_string()))
            }
        }
    }
}

/// Hash-addressed blob fetch.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn get_blob(&self, sha: &str) -> SyncResult<RemoteBlob>;
}

/// Path-and-branch addressed raw file fetch.
#[async_trait]
pub trait RawFileFetcher: Send + Sync {
    async fn fetch_raw(&self, path: &str, branch: &str) -> SyncResult<String>;
}

/// Bulk content fetch attached to a remote snapshot.
#[async_trait]
pub trait SnapshotContent: Send + Sync {
    /// Content for as many of `paths` as the remote can supply.
    async fn fetch_content(&self, paths: &[String]) -> SyncResult<BTreeMap<String, String>>;
}

/// How lazy hydration reaches remote content.
#[derive(Clone)]
pub enum RemoteContentSource {
    ByHash(Arc<dyn BlobFetcher>),
    ByPath {
        fetcher: Arc<dyn RawFileFetcher>,
        branch: String,
    },
}

impl RemoteContentSource {
    /// Fetch the content of `path`, known remotely as `sha`.
    pub async fn fetch(&self, path: &str, sha: &str) -> SyncResult<String> {
        match self {
            Self::ByHash(fetcher) => fetcher.get_blob(sha).await?.decode(),
            Self::ByPath { fetcher, branch } => fetcher.fetch_raw(path, branch).await,
        }
    }
}

impl fmt::Debug for RemoteContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByHash(_) => f.write_str("ByHash"),
            Self::ByPath { branch, .. } => f.debug_struct("ByPath").field("branch", branch).finish(),
        }
    }
}
