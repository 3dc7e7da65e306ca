use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{credentials::CredentialRef, scorer::result::DEFAULT_THRESHOLD};

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_function_to_apply() -> String {
    "sigmoid".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub credential: CredentialRef,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub top_k: Option<u32>,
    #[serde(default = "default_function_to_apply")]
    pub function_to_apply: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ScorerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            credential: CredentialRef::None,
            threshold: default_threshold(),
            top_k: None,
            function_to_apply: default_function_to_apply(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}
