use thiserror::Error;

use crate::prediction::BackendAvailability;

/// Failure of a single prediction or health request.
#[derive(Debug, Error)]
pub enum PredictionError {
    /// No response was received at all (DNS, refused connection, reset).
    #[error("Backend unreachable: {0}")]
    NetworkUnreachable(#[source] reqwest::Error),

    /// Non-2xx response with a structured `{"error": ...}` body.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Non-2xx response whose body could not be read as an error record.
    #[error("HTTP {status}: {reason}")]
    HttpUnparsed { status: u16, reason: String },

    /// 2xx response that does not match the documented record.
    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Could not build upload: {0}")]
    InvalidUpload(#[source] reqwest::Error),
}

impl PredictionError {
    /// HTTP status attached to the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::HttpUnparsed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure to turn a selected file into an uploadable asset.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is empty")]
    Empty(String),

    #[error("Failed to allocate preview: {0}")]
    Preview(#[source] std::io::Error),
}

/// A flow transition that was refused. State is unchanged unless noted.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The health probe failed or has not finished yet.
    #[error("Backend status: {0}; analysis is disabled")]
    BackendUnavailable(BackendAvailability),

    #[error("Select a scan before starting the analysis")]
    NoAsset,

    #[error("An analysis is already running")]
    AlreadyProcessing,

    #[error("Analysis already complete; reset to analyze another scan")]
    AlreadyComplete,

    /// A request dispatched before the last reset has not resolved yet.
    #[error("The previous analysis is still finishing")]
    PreviousInFlight,

    /// Capturing the replacement failed. The previous asset is already released.
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Failure to read or persist the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
