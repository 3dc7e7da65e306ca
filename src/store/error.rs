use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorKind {
    InvalidRequest,
    Transport,
    Conflict,
    ConcurrencyConflict,
    Codec,
    SchemaMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == StoreErrorKind::Conflict
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StoreError {}

pub fn invalid_request(message: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorKind::InvalidRequest, message)
}

pub fn transport_failure(message: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorKind::Transport, message)
}

pub fn write_conflict(message: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorKind::Conflict, message)
}

pub fn codec_error(message: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorKind::Codec, message)
}

pub fn schema_mismatch(message: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorKind::SchemaMismatch, message)
}
