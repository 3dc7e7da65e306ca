use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerErrorKind {
    InvalidRequest,
    Authentication,
    Transient,
    Protocol,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerError {
    pub kind: ScorerErrorKind,
    pub message: String,
    pub retryable: bool,
    pub http_status: Option<u16>,
}

impl ScorerError {
    pub fn new(kind: ScorerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: matches!(kind, ScorerErrorKind::Transient),
            http_status: None,
        }
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }
}

impl fmt::Display for ScorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.http_status {
            Some(status) => write!(f, "{} (status={})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ScorerError {}

pub fn invalid_request(message: impl Into<String>) -> ScorerError {
    ScorerError::new(ScorerErrorKind::InvalidRequest, message)
}

pub fn protocol_violation(message: impl Into<String>) -> ScorerError {
    ScorerError::new(ScorerErrorKind::Protocol, message)
}

pub fn internal_error(message: impl Into<String>) -> ScorerError {
    ScorerError::new(ScorerErrorKind::Internal, message)
}
