use std::sync::Arc;

use crate::store::{
    error::StoreError,
    ports::BlobTransport,
    types::{StoreBackendConfig, StoreConfig},
};

pub mod dropbox;
pub mod local_dir;
pub mod memory;

pub use dropbox::DropboxTransport;
pub use local_dir::LocalDirTransport;
pub use memory::InMemoryBlobTransport;

pub fn transport_from_config(config: &StoreConfig) -> Result<Arc<dyn BlobTransport>, StoreError> {
    Ok(match &config.backend {
        StoreBackendConfig::Dropbox {
            credential,
            endpoint,
            ..
        } => Arc::new(DropboxTransport::new(
            endpoint,
            credential,
            config.request_timeout(),
        )?),
        StoreBackendConfig::LocalDir { root, .. } => Arc::new(LocalDirTransport::new(root.clone())),
    })
}
