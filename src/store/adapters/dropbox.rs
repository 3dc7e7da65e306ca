use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    credentials::CredentialRef,
    store::{
        error::{StoreError, invalid_request, transport_failure, write_conflict},
        ports::{BlobObject, BlobTransport, BlobVersion, FetchOutcome, WriteMode},
    },
};

const API_ARG_HEADER: &str = "Dropbox-API-Arg";
const API_RESULT_HEADER: &str = "Dropbox-API-Result";

#[derive(Debug, Deserialize)]
struct DropboxErrorBody {
    #[serde(default)]
    error_summary: String,
}

#[derive(Debug, Deserialize)]
struct FileMetadata {
    rev: String,
}

/// Dropbox content API: `files/download` and `files/upload`, versioned by
/// the file `rev`.
#[derive(Clone)]
pub struct DropboxTransport {
    client: Client,
    endpoint: String,
    auth_header: String,
    timeout: Duration,
}

impl DropboxTransport {
    pub fn new(
        endpoint: &str,
        credential: &CredentialRef,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let auth_header = credential
            .resolve_auth_header()
            .map_err(|err| invalid_request(format!("dropbox credential: {err}")))?
            .ok_or_else(|| invalid_request("dropbox backend requires an access token"))?;
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| transport_failure(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth_header,
            timeout,
        })
    }

    fn url(&self, route: &str) -> String {
        format!("{}/2/files/{route}", self.endpoint)
    }
}

#[async_trait]
impl BlobTransport for DropboxTransport {
    async fn download(&self, path: &str) -> Result<FetchOutcome, StoreError> {
        let started_at = Instant::now();
        let response = self
            .client
            .post(self.url("download"))
            .timeout(self.timeout)
            .header(header::AUTHORIZATION, &self.auth_header)
            .header(API_ARG_HEADER, header_safe_json(&json!({ "path": path })))
            .send()
            .await
            .map_err(|err| transport_failure(format!("dropbox download failed: {err}")))?;

        let status = response.status().as_u16();
        tracing::debug!(
            target: "store.dropbox",
            path = %path,
            status = status,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "dropbox_download_response"
        );

        if status == 409 {
            let body = response.text().await.unwrap_or_default();
            if error_summary_starts_with(&body, "path/not_found") {
                return Ok(FetchOutcome::NotFound);
            }
            return Err(map_http_error("download", status, &body));
        }
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error("download", status, &body));
        }

        let metadata = response
            .headers()
            .get(API_RESULT_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| transport_failure("dropbox download response lacks file metadata"))?;
        let version = parse_rev(&metadata)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| transport_failure(format!("dropbox download body failed: {err}")))?;

        Ok(FetchOutcome::Found(BlobObject {
            bytes: bytes.to_vec(),
            version,
        }))
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        mode: WriteMode,
    ) -> Result<BlobVersion, StoreError> {
        let started_at = Instant::now();
        let arg = upload_arg(path, &mode);
        let response = self
            .client
            .post(self.url("upload"))
            .timeout(self.timeout)
            .header(header::AUTHORIZATION, &self.auth_header)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(API_ARG_HEADER, header_safe_json(&arg))
            .body(bytes)
            .send()
            .await
            .map_err(|err| transport_failure(format!("dropbox upload failed: {err}")))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(
            target: "store.dropbox",
            path = %path,
            status = status,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "dropbox_upload_response"
        );

        if status == 409 && error_summary_starts_with(&body, "path/conflict") {
            return Err(write_conflict(format!(
                "dropbox rejected conditional upload of '{path}': {}",
                body.chars().take(240).collect::<String>()
            )));
        }
        if !(200..300).contains(&status) {
            return Err(map_http_error("upload", status, &body));
        }

        parse_rev(&body)
    }
}

pub fn upload_arg(path: &str, mode: &WriteMode) -> Value {
    let mode = match mode {
        WriteMode::Overwrite => json!("overwrite"),
        WriteMode::Create => json!("add"),
        WriteMode::Update { expected } => json!({ ".tag": "update", "update": expected.as_str() }),
    };
    json!({
        "path": path,
        "mode": mode,
        "autorename": false,
        "mute": true,
    })
}

/// Serializes `value` with every non-ASCII character escaped, since HTTP
/// header values must stay ASCII.
pub fn header_safe_json(value: &Value) -> String {
    let mut out = String::new();
    for ch in value.to_string().chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units).iter() {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

pub fn parse_rev(metadata: &str) -> Result<BlobVersion, StoreError> {
    serde_json::from_str::<FileMetadata>(metadata)
        .map(|metadata| BlobVersion(metadata.rev))
        .map_err(|err| transport_failure(format!("unexpected dropbox metadata: {err}")))
}

fn error_summary_starts_with(body: &str, prefix: &str) -> bool {
    serde_json::from_str::<DropboxErrorBody>(body)
        .map(|parsed| parsed.error_summary.starts_with(prefix))
        .unwrap_or(false)
}

fn map_http_error(operation: &str, status: u16, body: &str) -> StoreError {
    let normalized_body = body.chars().take(240).collect::<String>();
    let reason = match status {
        401 => "authentication failed",
        403 => "access denied",
        409 => "request conflict",
        429 => "rate limited",
        500..=599 => "service unavailable",
        _ => "unexpected status",
    };
    let mut message = format!("dropbox {operation} {reason} (status {status})");
    if !normalized_body.is_empty() {
        message = format!("{message}: {normalized_body}");
    }
    transport_failure(message)
}
