use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::store::{
    error::{StoreError, write_conflict},
    ports::{BlobObject, BlobTransport, BlobVersion, FetchOutcome, WriteMode},
};

#[derive(Debug, Default)]
struct MemoryState {
    objects: HashMap<String, BlobObject>,
    next_version: u64,
    download_failure: Option<StoreError>,
    upload_failure: Option<StoreError>,
}

/// Process-local blob service with counter versions and one-shot failure
/// injection.
#[derive(Debug, Default)]
pub struct InMemoryBlobTransport {
    state: Mutex<MemoryState>,
    downloads: AtomicUsize,
    uploads: AtomicUsize,
}

impl InMemoryBlobTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, path: &str, bytes: Vec<u8>) -> BlobVersion {
        let mut state = self.state.lock().await;
        let version = next_version(&mut state);
        state.objects.insert(
            path.to_string(),
            BlobObject {
                bytes,
                version: version.clone(),
            },
        );
        version
    }

    pub async fn get(&self, path: &str) -> Option<BlobObject> {
        self.state.lock().await.objects.get(path).cloned()
    }

    pub async fn fail_next_download(&self, err: StoreError) {
        self.state.lock().await.download_failure = Some(err);
    }

    pub async fn fail_next_upload(&self, err: StoreError) {
        self.state.lock().await.upload_failure = Some(err);
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

fn next_version(state: &mut MemoryState) -> BlobVersion {
    state.next_version += 1;
    BlobVersion(format!("mem-{}", state.next_version))
}

#[async_trait]
impl BlobTransport for InMemoryBlobTransport {
    async fn download(&self, path: &str) -> Result<FetchOutcome, StoreError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        if let Some(err) = state.download_failure.take() {
            return Err(err);
        }
        Ok(match state.objects.get(path) {
            Some(object) => FetchOutcome::Found(object.clone()),
            None => FetchOutcome::NotFound,
        })
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        mode: WriteMode,
    ) -> Result<BlobVersion, StoreError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        if let Some(err) = state.upload_failure.take() {
            return Err(err);
        }

        let current = state.objects.get(path).map(|object| &object.version);
        match (&mode, current) {
            (WriteMode::Overwrite, _) | (WriteMode::Create, None) => {}
            (WriteMode::Create, Some(current)) => {
                return Err(write_conflict(format!(
                    "'{path}' already exists at version {}",
                    current.as_str()
                )));
            }
            (WriteMode::Update { expected }, Some(current)) if expected == current => {}
            (WriteMode::Update { expected }, _) => {
                return Err(write_conflict(format!(
                    "'{path}' changed since version {}",
                    expected.as_str()
                )));
            }
        }

        let version = next_version(&mut state);
        state.objects.insert(
            path.to_string(),
            BlobObject {
                bytes,
                version: version.clone(),
            },
        );
        Ok(version)
    }
}
