pub mod adapters;
pub mod error;
pub mod log_store;
pub mod ports;
pub mod table;
pub mod types;

pub use error::{StoreError, StoreErrorKind};
pub use log_store::{AppendReceipt, FetchedTable, RemoteLogStore};
pub use ports::{BlobObject, BlobTransport, BlobVersion, FetchOutcome, WriteMode};
pub use table::Table;
pub use types::{CommitMode, StoreBackendConfig, StoreConfig};
