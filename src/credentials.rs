use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a bearer token comes from. Secrets never live in the config file
/// unless `inline_token` is used explicitly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialRef {
    Env {
        var: String,
    },
    InlineToken {
        token: String,
    },
    #[default]
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("missing credential environment variable {0}")]
    MissingEnv(String),
    #[error("credential token cannot be empty")]
    EmptyToken,
}

impl CredentialRef {
    pub fn resolve_token(&self) -> Result<Option<String>, CredentialError> {
        match self {
            CredentialRef::Env { var } => {
                let token = env::var(var).map_err(|_| CredentialError::MissingEnv(var.clone()))?;
                if token.trim().is_empty() {
                    return Err(CredentialError::EmptyToken);
                }
                Ok(Some(token))
            }
            CredentialRef::InlineToken { token } => {
                if token.trim().is_empty() {
                    return Err(CredentialError::EmptyToken);
                }
                Ok(Some(token.clone()))
            }
            CredentialRef::None => Ok(None),
        }
    }

    pub fn resolve_auth_header(&self) -> Result<Option<String>, CredentialError> {
        Ok(self.resolve_token()?.map(|token| format!("Bearer {token}")))
    }
}
