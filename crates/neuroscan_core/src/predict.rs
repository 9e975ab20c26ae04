//! Wire types and the HTTP client for the remote inference service.

use crate::config::ClientConfig;
use crate::error::PredictionError;
use crate::source::Batch;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

const MAX_ERROR_BODY: usize = 200;

/// Body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(rename = "image")]
    pub payloads: Vec<String>,
}

impl PredictionRequest {
    pub fn from_batch(batch: &Batch) -> Self {
        Self {
            payloads: batch.payloads(),
        }
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

/// Successful answer from the service: one score per request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(rename = "result")]
    pub scores: Vec<f64>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Anything able to score a request.
pub trait InferenceClient {
    fn predict(
        &self,
        request: &PredictionRequest,
    ) -> impl Future<Output = Result<PredictionResponse, PredictionError>> + Send;
}

/// Check that a response carries `expected` scores, each within `[0, 1]`.
pub fn validate_response(
    expected: usize,
    response: &PredictionResponse,
) -> Result<(), PredictionError> {
    if response.scores.len() != expected {
        return Err(PredictionError::Malformed(format!(
            "expected {expected} scores, got {}",
            response.scores.len()
        )));
    }
    if let Some((idx, score)) = response
        .scores
        .iter()
        .enumerate()
        .find(|(_, s)| !(0.0..=1.0).contains(*s))
    {
        return Err(PredictionError::Malformed(format!(
            "score {idx} is {score}, outside [0, 1]"
        )));
    }
    Ok(())
}

/// JSON-over-HTTP client for the inference endpoint.
#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpInferenceClient {
    pub fn new(config: &ClientConfig) -> Result<Self, PredictionError> {
        let timeout = config.timeout();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PredictionError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, PredictionError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(PredictionError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        serde_json::from_slice(&body).map_err(|e| PredictionError::Malformed(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> PredictionError {
        if err.is_timeout() {
            PredictionError::Timeout(self.timeout)
        } else {
            PredictionError::Transport(err.to_string())
        }
    }
}

impl InferenceClient for HttpInferenceClient {
    fn predict(
        &self,
        request: &PredictionRequest,
    ) -> impl Future<Output = Result<PredictionResponse, PredictionError>> + Send {
        tracing::info!("posting {} images to {}", request.len(), self.endpoint);
        self.send(request)
    }
}

// Prefer the server's `{"error": ...}` field, else a prefix of the raw body.
fn error_message(body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        return parsed.error;
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty response body".to_string();
    }
    text.chars().take(MAX_ERROR_BODY).collect()
}
