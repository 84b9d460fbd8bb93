use std::time::Duration;

use crate::client::PredictionClient;
use crate::config::Config;
use crate::error::PredictionError;
use crate::prediction::{BackendAvailability, PredictionResult, ScanUpload};
use crate::simulator::Simulator;

/// Where predictions come from.
#[derive(Debug, Clone)]
pub enum Backend {
    Remote(PredictionClient),
    Simulated(Simulator),
}

impl Backend {
    pub fn from_config(config: &Config) -> Self {
        if config.simulate.enabled {
            Backend::Simulated(Simulator::new(Duration::from_millis(
                config.simulate.delay_ms,
            )))
        } else {
            Backend::Remote(PredictionClient::from_config(config))
        }
    }

    pub async fn check_health(&self) -> BackendAvailability {
        match self {
            Backend::Remote(client) => client.check_health().await,
            Backend::Simulated(_) => BackendAvailability::Available,
        }
    }

    pub async fn predict(&self, upload: &ScanUpload) -> Result<PredictionResult, PredictionError> {
        match self {
            Backend::Remote(client) => client.predict(upload).await,
            Backend::Simulated(sim) => Ok(sim.predict(upload).await),
        }
    }

    /// Short label for status output.
    pub fn describe(&self) -> String {
        match self {
            Backend::Remote(client) => client.origin().to_string(),
            Backend::Simulated(sim) => format!("simulated ({} ms)", sim.delay().as_millis()),
        }
    }
}
