use std::sync::{
    Arc,
    atomic::{AtomicI64, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Barrier;

use kote_survey::{
    record::ResponseRecord,
    store::{
        BlobTransport, BlobVersion, FetchOutcome, StoreError, Table, WriteMode,
        adapters::InMemoryBlobTransport, error::write_conflict,
    },
};

pub const LOG_PATH: &str = "/sentiment_logs.csv";

pub fn record(id: &str) -> ResponseRecord {
    ResponseRecord::from_fields([
        ("timestamp", "2026-10-19T10:00:00+09:00"),
        ("input_text", id),
        ("top_emotions", "기쁨(0.9)"),
    ])
}

pub async fn stored_table(transport: &InMemoryBlobTransport) -> Table {
    let object = transport
        .get(LOG_PATH)
        .await
        .expect("log object should exist");
    Table::decode(&object.bytes).expect("stored table should decode")
}

/// Holds the first `gated` downloads at a barrier until all of them have
/// fetched, so concurrent appends all read the same version.
pub struct GatedTransport {
    inner: Arc<InMemoryBlobTransport>,
    barrier: Barrier,
    gated: AtomicI64,
}

impl GatedTransport {
    pub fn new(inner: Arc<InMemoryBlobTransport>, writers: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(writers),
            gated: AtomicI64::new(writers as i64),
        }
    }
}

#[async_trait]
impl BlobTransport for GatedTransport {
    async fn download(&self, path: &str) -> Result<FetchOutcome, StoreError> {
        let outcome = self.inner.download(path).await?;
        if self.gated.fetch_sub(1, Ordering::SeqCst) > 0 {
            self.barrier.wait().await;
        }
        Ok(outcome)
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        mode: WriteMode,
    ) -> Result<BlobVersion, StoreError> {
        self.inner.upload(path, bytes, mode).await
    }
}

/// Rejects every conditional upload as if another writer always won.
#[derive(Default)]
pub struct AlwaysConflictTransport {
    pub uploads: AtomicUsize,
}

#[async_trait]
impl BlobTransport for AlwaysConflictTransport {
    async fn download(&self, _path: &str) -> Result<FetchOutcome, StoreError> {
        Ok(FetchOutcome::NotFound)
    }

    async fn upload(
        &self,
        path: &str,
        _bytes: Vec<u8>,
        _mode: WriteMode,
    ) -> Result<BlobVersion, StoreError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Err(write_conflict(format!("'{path}' was replaced concurrently")))
    }
}
