use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::Deserialize;

use crate::config::Config;
use crate::error::PredictionError;
use crate::prediction::{
    BackendAvailability, HealthReport, PredictionResponse, PredictionResult, ScanUpload,
};

const HEALTH_PATH: &str = "/api/health";
const PREDICT_PATH: &str = "/predict";

/// Body of a non-2xx response.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP client for the prediction backend.
///
/// One attempt per call: no retries, no timeout beyond reqwest's defaults,
/// no cancellation.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: reqwest::Client,
    origin: String,
}

impl PredictionClient {
    pub fn new(origin: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            origin: origin.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.backend_origin())
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.origin)
    }

    /// Fetch the backend health report.
    pub async fn health(&self) -> Result<HealthReport, PredictionError> {
        let resp = self
            .http
            .get(self.endpoint(HEALTH_PATH))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(PredictionError::NetworkUnreachable)?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let body = resp.text().await.map_err(body_read_error)?;
        serde_json::from_str(&body).map_err(|e| PredictionError::MalformedResponse(e.to_string()))
    }

    /// Probe the backend once. Any failure maps to `Unavailable`.
    pub async fn check_health(&self) -> BackendAvailability {
        match self.health().await {
            Ok(report) => {
                log::info!(
                    "Backend healthy at {}: status={} model_loaded={} ({})",
                    self.origin,
                    report.status,
                    report.model_loaded,
                    report.message
                );
                BackendAvailability::Available
            }
            Err(e) => {
                log::warn!("Backend health check failed for {}: {e}", self.origin);
                BackendAvailability::Unavailable
            }
        }
    }

    /// Upload a scan as multipart field `file` and decode the prediction.
    pub async fn predict(&self, upload: &ScanUpload) -> Result<PredictionResult, PredictionError> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(upload.media_type)
            .map_err(PredictionError::InvalidUpload)?;
        let form = Form::new().part("file", part);

        log::info!(
            "Uploading {} ({} bytes) to {}",
            upload.file_name,
            upload.bytes.len(),
            self.endpoint(PREDICT_PATH)
        );

        let resp = self
            .http
            .post(self.endpoint(PREDICT_PATH))
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(PredictionError::NetworkUnreachable)?;

        if !resp.status().is_success() {
            let err = error_from_response(resp).await;
            log::error!("Prediction request failed: {err}");
            return Err(err);
        }

        let body = resp.text().await.map_err(body_read_error)?;
        let parsed: PredictionResponse = serde_json::from_str(&body)
            .map_err(|e| PredictionError::MalformedResponse(format!("{e}: {body}")))?;

        log::info!(
            "Prediction: {} ({:.2}% confidence)",
            parsed.prediction,
            parsed.confidence
        );
        Ok(parsed.into())
    }
}

/// The status line arrived but the body did not come through intact.
fn body_read_error(e: reqwest::Error) -> PredictionError {
    PredictionError::MalformedResponse(format!("failed to read response body: {e}"))
}

/// Map a non-2xx response to `Http` when it carries `{"error": ...}`,
/// otherwise to `HttpUnparsed` with the status line.
async fn error_from_response(resp: Response) -> PredictionError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            error: Some(message),
        }) if !message.is_empty() => PredictionError::Http {
            status: status.as_u16(),
            message,
        },
        _ => PredictionError::HttpUnparsed {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        },
    }
}
