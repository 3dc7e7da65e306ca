use std::{sync::Arc, time::Duration};

use crate::{
    record::ResponseRecord,
    store::{
        error::{StoreError, StoreErrorKind, invalid_request},
        ports::{BlobTransport, BlobVersion, FetchOutcome, WriteMode},
        table::Table,
        types::{CommitMode, StoreConfig},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTable {
    pub table: Table,
    /// `None` when the remote object does not exist yet.
    pub version: Option<BlobVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReceipt {
    pub row_count: usize,
    pub attempts: u32,
    pub version: BlobVersion,
}

/// The shared response log: one tabular object on a blob service, grown by
/// fetch, merge, and upload.
///
/// Nothing here locks the remote object. In [`CommitMode::Overwrite`] two
/// concurrent appends that both fetch before either uploads end with only the
/// later writer's row (lost update). [`CommitMode::Versioned`] turns that
/// interleaving into a write conflict and retries the whole cycle.
#[derive(Clone)]
pub struct RemoteLogStore {
    transport: Arc<dyn BlobTransport>,
    path: String,
    mode: CommitMode,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl RemoteLogStore {
    pub fn new(transport: Arc<dyn BlobTransport>, path: impl Into<String>) -> Self {
        let defaults = StoreConfig::default();
        Self {
            transport,
            path: path.into(),
            mode: defaults.commit_mode,
            max_attempts: defaults.max_commit_attempts,
            retry_backoff: defaults.retry_backoff(),
        }
    }

    pub fn from_config(
        transport: Arc<dyn BlobTransport>,
        config: &StoreConfig,
    ) -> Result<Self, StoreError> {
        if config.max_commit_attempts == 0 {
            return Err(invalid_request("store.max_commit_attempts must be at least 1"));
        }
        Ok(Self::new(transport, config.backend.object_path())
            .with_commit_mode(config.commit_mode)
            .with_max_attempts(config.max_commit_attempts)
            .with_retry_backoff(config.retry_backoff()))
    }

    pub fn with_commit_mode(mut self, mode: CommitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn commit_mode(&self) -> CommitMode {
        self.mode
    }

    pub async fn fetch_or_init(&self) -> Result<FetchedTable, StoreError> {
        match self.transport.download(&self.path).await? {
            FetchOutcome::Found(object) => {
                let table = Table::decode(&object.bytes)?;
                tracing::debug!(
                    target: "store",
                    path = %self.path,
                    version = %object.version.as_str(),
                    rows = table.len(),
                    "log_fetched"
                );
                Ok(FetchedTable {
                    table,
                    version: Some(object.version),
                })
            }
            FetchOutcome::NotFound => {
                tracing::info!(target: "store", path = %self.path, "log_absent_starting_empty");
                Ok(FetchedTable {
                    table: Table::empty(),
                    version: None,
                })
            }
        }
    }

    pub async fn append(&self, record: &ResponseRecord) -> Result<AppendReceipt, StoreError> {
        match self.mode {
            CommitMode::Overwrite => self.merge_and_upload(record, false).await,
            CommitMode::Versioned => self.append_versioned(record).await,
        }
    }

    async fn append_versioned(&self, record: &ResponseRecord) -> Result<AppendReceipt, StoreError> {
        for attempt in 1..=self.max_attempts {
            match self.merge_and_upload(record, true).await {
                Ok(receipt) => {
                    return Ok(AppendReceipt {
                        attempts: attempt,
                        ..receipt
                    });
                }
                Err(err) if err.is_conflict() => {
                    tracing::warn!(
                        target: "store",
                        path = %self.path,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "log_write_conflict"
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_backoff * attempt).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        Err(StoreError::new(
            StoreErrorKind::ConcurrencyConflict,
            format!(
                "concurrent write conflict on '{}' persisted after {} attempts",
                self.path, self.max_attempts
            ),
        ))
    }

    async fn merge_and_upload(
        &self,
        record: &ResponseRecord,
        versioned: bool,
    ) -> Result<AppendReceipt, StoreError> {
        let FetchedTable { mut table, version } = self.fetch_or_init().await?;
        table.append(record)?;
        let bytes = table.encode()?;

        let mode = match (versioned, version) {
            (false, _) => WriteMode::Overwrite,
            (true, None) => WriteMode::Create,
            (true, Some(expected)) => WriteMode::Update { expected },
        };
        let byte_count = bytes.len();
        let version = self.transport.upload(&self.path, bytes, mode).await?;

        tracing::info!(
            target: "store",
            path = %self.path,
            rows = table.len(),
            bytes = byte_count,
            version = %version.as_str(),
            "log_committed"
        );
        Ok(AppendReceipt {
            row_count: table.len(),
            attempts: 1,
            version,
        })
    }
}
