use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification label returned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnosis {
    Normal,
    Pneumonia,
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnosis::Normal => f.write_str("Normal"),
            Diagnosis::Pneumonia => f.write_str("Pneumonia"),
        }
    }
}

/// Outcome of one analysis.
///
/// `probability_percent` and `confidence_percent` are separate fields and may
/// differ. The remote backend only reports a confidence, so both carry the
/// same number there; the simulated backend draws them independently.
/// `label` is authoritative: never derive the diagnosis from either number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    pub label: Diagnosis,
    pub probability_percent: f64,
    pub confidence_percent: f64,
}

impl PredictionResult {
    /// Build a result from a backend record that only carries a confidence.
    pub fn from_confidence(label: Diagnosis, confidence: f64) -> Self {
        let confidence = clamp_percent(confidence);
        Self {
            label,
            probability_percent: confidence,
            confidence_percent: confidence,
        }
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Wire format of a successful `POST /predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: Diagnosis,
    pub confidence: f64,
}

impl From<PredictionResponse> for PredictionResult {
    fn from(resp: PredictionResponse) -> Self {
        Self::from_confidence(resp.prediction, resp.confidence)
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthReport {
    pub status: String,
    pub message: String,
    pub model_loaded: bool,
}

/// Result of the startup health probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendAvailability {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl fmt::Display for BackendAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendAvailability::Unknown => f.write_str("checking"),
            BackendAvailability::Available => f.write_str("available"),
            BackendAvailability::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// Everything the predict call needs, detached from the asset that owns it.
#[derive(Debug, Clone)]
pub struct ScanUpload {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_confidence_fills_both_fields() {
        let resp: PredictionResponse =
            serde_json::from_str(r#"{"prediction":"Pneumonia","confidence":87.5}"#).unwrap();
        let result = PredictionResult::from(resp);
        assert_eq!(result.label, Diagnosis::Pneumonia);
        assert_eq!(result.probability_percent, 87.5);
        assert_eq!(result.confidence_percent, 87.5);
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(
            PredictionResult::from_confidence(Diagnosis::Normal, 140.0).confidence_percent,
            100.0
        );
        assert_eq!(
            PredictionResult::from_confidence(Diagnosis::Normal, -3.0).confidence_percent,
            0.0
        );
    }

    #[test]
    fn unknown_label_is_rejected() {
        let parsed =
            serde_json::from_str::<PredictionResponse>(r#"{"prediction":"Covid","confidence":50}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn health_report_tolerates_extra_and_missing_fields() {
        let report: HealthReport = serde_json::from_str(
            r#"{"status":"ok","message":"running","endpoints":{"/predict":"POST"}}"#,
        )
        .unwrap();
        assert_eq!(report.status, "ok");
        assert!(!report.model_loaded);
    }
}
