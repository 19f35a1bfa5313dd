//! Content hashing schemes.
//!
//! Local content is addressed the way Git addresses blobs so that hashes
//! recorded locally compare directly against a remote tree listing. Remotes
//! that address content differently declare a [`HashScheme`] and the engine
//! re-hashes local bytes with it.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::change::Change;

/// Domain tag prepended to BLAKE3 content hashes.
const BLAKE3_DOMAIN: &str = "gws-blob-v1";

/// How content bytes map to a content hash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashScheme {
    /// SHA-1 over `"blob <len>\0" + content`, identical to a Git blob id.
    #[default]
    GitBlob,
    /// Domain-separated BLAKE3.
    Blake3,
}

impl HashScheme {
    /// Hash raw bytes, returning lower-case hex.
    pub fn hash(&self, data: &[u8]) -> String {
        match self {
            HashScheme::GitBlob => {
                let mut hasher = Sha1::new();
                hasher.update(format!("blob {}\0", data.len()).as_bytes());
                hasher.update(data);
                hex::encode(hasher.finalize())
            }
            HashScheme::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                hasher.update(BLAKE3_DOMAIN.as_bytes());
                hasher.update(b":");
                hasher.update(data);
                hasher.finalize().to_hex().to_string()
            }
        }
    }

    /// Hash text content.
    pub fn hash_str(&self, content: &str) -> String {
        self.hash(content.as_bytes())
    }

    /// Verify that content produces the expected hash.
    pub fn verify(&self, content: &str, expected: &str) -> bool {
        self.hash_str(content) == expected
    }
}

/// Plain SHA-1 of `data`, lower-case hex.
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

/// Deterministic idempotency key for a commit of `changes` on top of `parent`.
pub fn commit_key(parent: &str, changes: &[Change]) -> Result<String, crate::TypeError> {
    let serialized =
        serde_json::to_string(changes).map_err(|e| crate::TypeError::Serialization(e.to_string()))?;
    let mut data = String::with_capacity(parent.len() + serialized.len());
    data.push_str(parent);
    data.push_str(&serialized);
    Ok(sha1_hex(data.as_bytes()))
}

/// Commit identifier derived from the parent and the commit key.
pub fn commit_sha(parent: &str, commit_key: &str) -> String {
    sha1_hex(format!("{parent}|{commit_key}").as_bytes())
}
