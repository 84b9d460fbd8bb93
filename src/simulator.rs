use std::time::Duration;

use rand::Rng;

use crate::prediction::{Diagnosis, PredictionResult, ScanUpload};

/// Offline stand-in for the prediction backend.
///
/// Probability, confidence and label are drawn independently, so a
/// "Normal" label can come with a high probability. The label wins.
#[derive(Debug, Clone)]
pub struct Simulator {
    delay: Duration,
}

impl Simulator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for the configured delay and return a fabricated result.
    pub async fn predict(&self, upload: &ScanUpload) -> PredictionResult {
        let result = draw(&mut rand::thread_rng());
        log::info!(
            "Simulating analysis of {} for {:?}",
            upload.file_name,
            self.delay
        );
        tokio::time::sleep(self.delay).await;
        result
    }
}

/// One fabricated result: probability in 70..=99 or 10..=49 (even odds),
/// confidence in 85..=99, label Pneumonia with 30% odds.
pub fn draw<R: Rng>(rng: &mut R) -> PredictionResult {
    let probability = if rng.gen::<f64>() > 0.5 {
        rng.gen_range(70..100)
    } else {
        rng.gen_range(10..50)
    };
    let confidence = rng.gen_range(85..100);
    let label = if rng.gen::<f64>() > 0.3 {
        Diagnosis::Normal
    } else {
        Diagnosis::Pneumonia
    };

    PredictionResult {
        label,
        probability_percent: f64::from(probability),
        confidence_percent: f64::from(confidence),
    }
}
