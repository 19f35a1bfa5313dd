use std::path::Path;

use gws_types::HashScheme;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Repository settings, usually read from a TOML file.
///
/// ```toml
/// branch = "main"
/// hash_scheme = "git-blob"
/// log_filter = "gws_sync=debug,info"
///
/// [adapter]
/// kind = "github"
/// owner = "acme"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Branch used by path-addressed remote fetches.
    pub branch: String,
    /// Scheme for local content hashes.
    pub hash_scheme: HashScheme,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Opaque hosting metadata, seeded into the index record on open.
    pub adapter: Option<toml::Table>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            branch: "main".to_string(),
            hash_scheme: HashScheme::GitBlob,
            log_filter: "info".to_string(),
            adapter: None,
        }
    }
}

impl RepositoryConfig {
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// The adapter table as JSON, the form stored in the index record.
    pub fn adapter_json(&self) -> SdkResult<Option<serde_json::Value>> {
        self.adapter
            .as_ref()
            .map(|table| serde_json::to_value(table).map_err(|e| SdkError::Config(e.to_string())))
            .transpose()
    }
}
