use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::store::error::StoreError;

/// Opaque content version reported by the blob service (a Dropbox `rev`,
/// a content digest, a counter).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobVersion(pub String);

impl BlobVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    pub bytes: Vec<u8>,
    pub version: BlobVersion,
}

/// Result of a download. Absence is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(BlobObject),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace whatever is stored, unconditionally.
    Overwrite,
    /// Succeed only if nothing is stored at the path yet.
    Create,
    /// Succeed only if the stored version still equals `expected`.
    Update { expected: BlobVersion },
}

/// Byte-level access to a remote object by path.
///
/// Implementations must report a rejected `Create`/`Update` precondition as
/// [`crate::store::StoreErrorKind::Conflict`], and every other failure
/// except absence as [`crate::store::StoreErrorKind::Transport`].
#[async_trait]
pub trait BlobTransport: Send + Sync {
    async fn download(&self, path: &str) -> Result<FetchOutcome, StoreError>;

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        mode: WriteMode,
    ) -> Result<BlobVersion, StoreError>;
}
