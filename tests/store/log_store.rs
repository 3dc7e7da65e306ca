use std::sync::Arc;

use kote_survey::store::{
    CommitMode, RemoteLogStore, StoreConfig, StoreErrorKind, Table,
    adapters::{InMemoryBlobTransport, LocalDirTransport},
    error::transport_failure,
};

use crate::support::{LOG_PATH, record, stored_table};

#[tokio::test]
async fn given_absent_log_when_fetch_or_init_then_empty_table_without_schema() {
    let memory = Arc::new(InMemoryBlobTransport::new());
    let store = RemoteLogStore::new(memory, LOG_PATH);

    let fetched = store.fetch_or_init().await.expect("absent log is not an error");
    assert!(fetched.table.is_empty());
    assert!(!fetched.table.has_schema());
    assert_eq!(fetched.version, None);
}

#[tokio::test]
async fn given_download_failure_when_append_then_transport_error_and_nothing_written() {
    let memory = Arc::new(InMemoryBlobTransport::new());
    memory.insert(LOG_PATH, Table::empty().encode().expect("encode")).await;
    memory
        .fail_next_download(transport_failure("connection reset"))
        .await;
    let store = RemoteLogStore::new(Arc::clone(&memory) as _, LOG_PATH);

    let err = store
        .append(&record("r1"))
        .await
        .expect_err("a failed download must not look like an absent log");
    assert_eq!(err.kind, StoreErrorKind::Transport);
    assert_eq!(memory.upload_count(), 0);
}

#[tokio::test]
async fn given_sequential_appends_when_fetched_then_rows_keep_commit_order() {
    let memory = Arc::new(InMemoryBlobTransport::new());
    let store = RemoteLogStore::new(Arc::clone(&memory) as _, LOG_PATH);

    for id in ["r1", "r2", "r3"] {
        store.append(&record(id)).await.expect("append succeeds");
    }

    let table = stored_table(&memory).await;
    assert_eq!(
        table.columns(),
        &["timestamp".to_string(), "input_text".to_string(), "top_emotions".to_string()]
    );
    assert_eq!(
        table.column_values("input_text").expect("column exists"),
        vec!["r1", "r2", "r3"]
    );
    let fetched = store.fetch_or_init().await.expect("fetch");
    assert_eq!(fetched.table, table);
}

#[tokio::test]
async fn given_upload_failure_when_append_then_error_and_remote_unchanged() {
    let memory = Arc::new(InMemoryBlobTransport::new());
    let store = RemoteLogStore::new(Arc::clone(&memory) as _, LOG_PATH);
    store.append(&record("r1")).await.expect("first append");
    memory
        .fail_next_upload(transport_failure("insufficient_space"))
        .await;

    store
        .append(&record("r2"))
        .await
        .expect_err("upload failure surfaces");
    assert_eq!(stored_table(&memory).await.len(), 1);

    let receipt = store.append(&record("r2")).await.expect("retry succeeds");
    assert_eq!(receipt.row_count, 2);
}

#[tokio::test]
async fn given_corrupt_log_when_fetch_then_codec_error() {
    let memory = Arc::new(InMemoryBlobTransport::new());
    memory.insert(LOG_PATH, vec![0xff, 0xfe, b'\n', 0x80]).await;
    let store = RemoteLogStore::new(memory, LOG_PATH);

    let err = store.fetch_or_init().await.expect_err("invalid utf-8 fails");
    assert_eq!(err.kind, StoreErrorKind::Codec);
}

#[tokio::test]
async fn given_record_with_unknown_column_when_append_then_schema_mismatch() {
    let memory = Arc::new(InMemoryBlobTransport::new());
    let store = RemoteLogStore::new(Arc::clone(&memory) as _, LOG_PATH);
    store.append(&record("r1")).await.expect("first append");

    let odd = kote_survey::record::ResponseRecord::from_fields([("mood", "?")]);
    let err = store.append(&odd).await.expect_err("unknown column");
    assert_eq!(err.kind, StoreErrorKind::SchemaMismatch);
    assert_eq!(stored_table(&memory).await.len(), 1);
}

#[tokio::test]
async fn given_zero_attempts_in_config_when_from_config_then_rejected() {
    let config = StoreConfig {
        max_commit_attempts: 0,
        ..StoreConfig::default()
    };
    let err = RemoteLogStore::from_config(Arc::new(InMemoryBlobTransport::new()), &config)
        .err()
        .expect("zero attempts is invalid");
    assert_eq!(err.kind, StoreErrorKind::InvalidRequest);
}

#[tokio::test]
async fn given_local_dir_backend_when_versioned_appends_then_file_holds_all_rows() {
    let root = std::env::temp_dir().join(format!("kote-survey-store-test-{}", uuid::Uuid::now_v7()));
    let transport = Arc::new(LocalDirTransport::new(root.clone()));
    let store =
        RemoteLogStore::new(transport, "logs/responses.csv").with_commit_mode(CommitMode::Versioned);

    store.append(&record("r1")).await.expect("create");
    let receipt = store.append(&record("r2")).await.expect("update");
    assert_eq!(receipt.row_count, 2);
    assert_eq!(receipt.attempts, 1);

    let bytes = std::fs::read(root.join("logs/responses.csv")).expect("file exists");
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"), "csv carries a utf-8 bom");
    assert_eq!(Table::decode(&bytes).expect("decode").len(), 2);

    let _ = std::fs::remove_dir_all(&root);
}
