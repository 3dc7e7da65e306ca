use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::scorer::{
    error::{ScorerError, ScorerErrorKind, internal_error, invalid_request, protocol_violation},
    ports::{EmotionScorer, LabelScore},
    types::ScorerConfig,
};

/// Client for a hosted text-classification endpoint that speaks the
/// HuggingFace inference wire format.
#[derive(Clone)]
pub struct HttpClassifierScorer {
    client: Client,
    endpoint: String,
    auth_header: Option<String>,
    parameters: Value,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifierResponse {
    Batched(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
    Failure {
        error: String,
        #[serde(default)]
        estimated_time: Option<f64>,
    },
}

impl HttpClassifierScorer {
    pub fn new(config: &ScorerConfig) -> Result<Self, ScorerError> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or_else(|| invalid_request("classifier scorer requires scorer.endpoint"))?;
        let auth_header = config
            .credential
            .resolve_auth_header()
            .map_err(|err| {
                ScorerError::new(ScorerErrorKind::Authentication, err.to_string())
                    .with_retryable(false)
            })?;
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| internal_error(format!("failed to build http client: {err}")))?;

        let mut parameters = json!({ "function_to_apply": config.function_to_apply });
        if let Some(top_k) = config.top_k {
            parameters["top_k"] = json!(top_k);
        }

        Ok(Self {
            client,
            endpoint,
            auth_header,
            parameters,
            timeout: config.request_timeout(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmotionScorer for HttpClassifierScorer {
    async fn score(&self, text: &str) -> Result<Vec<LabelScore>, ScorerError> {
        let started_at = Instant::now();
        let body = json!({
            "inputs": text,
            "parameters": self.parameters,
        });

        let mut request = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body);
        if let Some(auth_header) = &self.auth_header {
            request = request.header(header::AUTHORIZATION, auth_header);
        }

        let response = request.send().await.map_err(|err| {
            tracing::debug!(
                target: "scorer.http",
                endpoint = %self.endpoint,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                error = %err,
                "classifier_http_error"
            );
            ScorerError::new(
                ScorerErrorKind::Transient,
                format!("classifier request failed: {err}"),
            )
        })?;

        let status = response.status().as_u16();
        let payload = response.text().await.map_err(|err| {
            ScorerError::new(
                ScorerErrorKind::Transient,
                format!("failed to read classifier response: {err}"),
            )
        })?;
        tracing::debug!(
            target: "scorer.http",
            endpoint = %self.endpoint,
            status = status,
            body_bytes = payload.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "classifier_http_response"
        );

        if !(200..300).contains(&status) {
            return Err(map_http_error(status, &payload));
        }

        parse_classifier_body(&payload)
    }
}

pub fn parse_classifier_body(body: &str) -> Result<Vec<LabelScore>, ScorerError> {
    let parsed: ClassifierResponse = serde_json::from_str(body)
        .map_err(|err| protocol_violation(format!("unexpected classifier payload: {err}")))?;

    let scores = match parsed {
        ClassifierResponse::Batched(mut batches) => {
            if batches.len() > 1 {
                return Err(protocol_violation(format!(
                    "expected one classification batch, got {}",
                    batches.len()
                )));
            }
            batches.pop().unwrap_or_default()
        }
        ClassifierResponse::Flat(scores) => scores,
        ClassifierResponse::Failure {
            error,
            estimated_time,
        } => {
            let mut message = format!("classifier reported error: {error}");
            if let Some(estimated_time) = estimated_time {
                message = format!("{message} (estimated_time={estimated_time}s)");
            }
            return Err(ScorerError::new(ScorerErrorKind::Transient, message));
        }
    };

    if let Some(bad) = scores
        .iter()
        .find(|item| !item.score.is_finite() || !(0.0..=1.0).contains(&item.score))
    {
        return Err(protocol_violation(format!(
            "label '{}' has out-of-range confidence {}",
            bad.label, bad.score
        )));
    }

    Ok(scores)
}

pub fn map_http_error(status: u16, body: &str) -> ScorerError {
    let normalized_body = body.chars().take(240).collect::<String>();

    let mut err = if status == 401 || status == 403 {
        ScorerError::new(ScorerErrorKind::Authentication, "classifier rejected credentials")
            .with_retryable(false)
    } else if status == 408 || status == 429 {
        ScorerError::new(
            ScorerErrorKind::Transient,
            format!("classifier returned status {status}"),
        )
    } else if (400..500).contains(&status) {
        ScorerError::new(
            ScorerErrorKind::InvalidRequest,
            format!("classifier returned status {status}"),
        )
    } else {
        ScorerError::new(
            ScorerErrorKind::Transient,
            format!("classifier returned status {status}"),
        )
    };
    err = err.with_http_status(status);

    if !normalized_body.is_empty() {
        err.message = format!("{}: {}", err.message, normalized_body);
    }

    err
}
