use std::{
    collections::HashMap,
    ffi::OsString,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::{
    fs,
    sync::Mutex,
    time::{Instant, sleep},
};

use crate::store::{
    error::{StoreError, invalid_request, transport_failure, write_conflict},
    ports::{BlobObject, BlobTransport, BlobVersion, FetchOutcome, WriteMode},
};

const LOCK_SUFFIX: &str = ".lock";
const LOCK_POLL: Duration = Duration::from_millis(5);
const LOCK_WAIT: Duration = Duration::from_secs(10);
const LOCK_STALE_AFTER: Duration = Duration::from_secs(30);

/// Blob service backed by a local directory. Versions are SHA-256 digests of
/// the file content; writes land through a temp file and a rename.
///
/// The version check, temp write and rename of one upload run under a
/// per-path lock: an in-process mutex shared by clones, plus a `<file>.lock`
/// sibling created exclusively so other processes on the same root serialize
/// too.
#[derive(Debug, Clone)]
pub struct LocalDirTransport {
    root: PathBuf,
    path_locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl LocalDirTransport {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            path_locks: Arc::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(path.trim_start_matches('/'));
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if relative.as_os_str().is_empty() || !safe {
            return Err(invalid_request(format!(
                "object path '{path}' must be a relative path without '..'"
            )));
        }
        Ok(self.root.join(relative))
    }

    async fn read_current(&self, file: &Path) -> Result<Option<BlobObject>, StoreError> {
        match fs::read(file).await {
            Ok(bytes) => Ok(Some(BlobObject {
                version: digest_version(&bytes),
                bytes,
            })),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(transport_failure(format!(
                "failed to read log object '{}': {err}",
                file.display()
            ))),
        }
    }

    async fn path_lock(&self, file: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.path_locks.lock().await;
        Arc::clone(locks.entry(file.to_path_buf()).or_default())
    }

    async fn write_locked(
        &self,
        path: &str,
        file: &Path,
        bytes: Vec<u8>,
        mode: WriteMode,
    ) -> Result<BlobVersion, StoreError> {
        if mode != WriteMode::Overwrite {
            let current = self.read_current(file).await?;
            match (&mode, current.as_ref().map(|object| &object.version)) {
                (WriteMode::Create, Some(current)) => {
                    return Err(write_conflict(format!(
                        "'{path}' already exists at version {}",
                        current.as_str()
                    )));
                }
                (WriteMode::Update { expected }, current) if current != Some(expected) => {
                    return Err(write_conflict(format!(
                        "'{path}' changed since version {}",
                        expected.as_str()
                    )));
                }
                _ => {}
            }
        }

        let version = digest_version(&bytes);
        let tmp_path = file.with_extension(format!("{}.tmp", uuid::Uuid::now_v7()));
        fs::write(&tmp_path, &bytes).await.map_err(|err| {
            transport_failure(format!(
                "failed to write log temp file '{}': {err}",
                tmp_path.display()
            ))
        })?;
        if let Err(err) = fs::rename(&tmp_path, file).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(transport_failure(format!(
                "failed to replace log object '{}' from '{}': {err}",
                file.display(),
                tmp_path.display()
            )));
        }

        Ok(version)
    }
}

/// Exclusive `<file>.lock` marker, removed on drop.
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    async fn acquire(file: &Path) -> Result<Self, StoreError> {
        let mut name = OsString::from(file.as_os_str());
        name.push(LOCK_SUFFIX);
        let path = PathBuf::from(name);
        let deadline = Instant::now() + LOCK_WAIT;

        loop {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok(Self { path }),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(&path).await {
                        tracing::warn!(
                            target: "store",
                            lock = %path.display(),
                            "stale_lock_removed"
                        );
                        let _ = fs::remove_file(&path).await;
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(transport_failure(format!(
                            "timed out waiting for lock '{}'",
                            path.display()
                        )));
                    }
                    sleep(LOCK_POLL).await;
                }
                Err(err) => {
                    return Err(transport_failure(format!(
                        "failed to create lock '{}': {err}",
                        path.display()
                    )));
                }
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

async fn is_stale(lock: &Path) -> bool {
    let Ok(metadata) = fs::metadata(lock).await else {
        return false;
    };
    metadata
        .modified()
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > LOCK_STALE_AFTER)
}

pub fn digest_version(bytes: &[u8]) -> BlobVersion {
    let digest = Sha256::digest(bytes);
    BlobVersion(
        digest
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>(),
    )
}

#[async_trait]
impl BlobTransport for LocalDirTransport {
    async fn download(&self, path: &str) -> Result<FetchOutcome, StoreError> {
        let file = self.resolve(path)?;
        Ok(match self.read_current(&file).await? {
            Some(object) => FetchOutcome::Found(object),
            None => FetchOutcome::NotFound,
        })
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        mode: WriteMode,
    ) -> Result<BlobVersion, StoreError> {
        let file = self.resolve(path)?;
        let parent = file.parent().ok_or_else(|| {
            invalid_request(format!("log object '{}' has no parent", file.display()))
        })?;
        fs::create_dir_all(parent).await.map_err(|err| {
            transport_failure(format!(
                "failed to create log directory '{}': {err}",
                parent.display()
            ))
        })?;

        let path_lock = self.path_lock(&file).await;
        let _in_process = path_lock.lock().await;
        let _cross_process = LockFile::acquire(&file).await?;
        self.write_locked(path, &file, bytes, mode).await
    }
}
