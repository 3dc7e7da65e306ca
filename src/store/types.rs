use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::credentials::CredentialRef;

pub const DEFAULT_DROPBOX_CONTENT_ENDPOINT: &str = "https://content.dropboxapi.com";

fn default_commit_mode() -> CommitMode {
    CommitMode::Overwrite
}

fn default_max_commit_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    200
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_dropbox_endpoint() -> String {
    DEFAULT_DROPBOX_CONTENT_ENDPOINT.to_string()
}

/// How `append` writes the merged table back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Unconditional overwrite. Two writers that both fetch before either
    /// uploads lose the earlier writer's row.
    Overwrite,
    /// Upload only if the remote version is unchanged since the fetch, and
    /// retry the whole fetch-merge-write cycle otherwise.
    Versioned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreBackendConfig {
    Dropbox {
        path: String,
        #[serde(default)]
        credential: CredentialRef,
        #[serde(default = "default_dropbox_endpoint")]
        endpoint: String,
    },
    LocalDir {
        root: PathBuf,
        path: String,
    },
}

impl StoreBackendConfig {
    pub fn object_path(&self) -> &str {
        match self {
            StoreBackendConfig::Dropbox { path, .. } => path,
            StoreBackendConfig::LocalDir { path, .. } => path,
        }
    }
}

impl Default for StoreBackendConfig {
    fn default() -> Self {
        StoreBackendConfig::LocalDir {
            root: PathBuf::from("./state"),
            path: "sentiment_logs.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackendConfig,
    #[serde(default = "default_commit_mode")]
    pub commit_mode: CommitMode,
    #[serde(default = "default_max_commit_attempts")]
    pub max_commit_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl StoreConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackendConfig::default(),
            commit_mode: default_commit_mode(),
            max_commit_attempts: default_max_commit_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}
