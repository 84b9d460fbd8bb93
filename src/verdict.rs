use crate::prediction::{Diagnosis, PredictionResult};

pub const POSITIVE_RECOMMENDATION: &str =
    "Please consult with a healthcare professional for proper diagnosis and treatment.";
pub const NEGATIVE_RECOMMENDATION: &str =
    "No signs of pneumonia detected. Continue regular health monitoring.";

/// Qualitative band for a confidence percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn for_percent(confidence: f64) -> Self {
        if confidence > 90.0 {
            ConfidenceBand::VeryHigh
        } else if confidence > 70.0 {
            ConfidenceBand::High
        } else if confidence > 50.0 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceBand::VeryHigh => "Very High",
            ConfidenceBand::High => "High",
            ConfidenceBand::Medium => "Medium",
            ConfidenceBand::Low => "Low",
        }
    }
}

/// A prediction ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayVerdict {
    pub is_positive: bool,
    pub probability_percent: u8,
    pub confidence_percent: u8,
    pub confidence_band: ConfidenceBand,
    pub headline: &'static str,
    pub summary: String,
    pub recommendation: &'static str,
}

/// Map a prediction to its display form. The label alone decides positivity.
pub fn render(result: &PredictionResult) -> DisplayVerdict {
    let is_positive = result.label == Diagnosis::Pneumonia;
    let probability_percent = whole_percent(result.probability_percent);
    let confidence_percent = whole_percent(result.confidence_percent);

    DisplayVerdict {
        is_positive,
        probability_percent,
        confidence_percent,
        confidence_band: ConfidenceBand::for_percent(result.confidence_percent),
        headline: if is_positive {
            "Pneumonia Detected"
        } else {
            "No Pneumonia Detected"
        },
        summary: format!("AI analysis complete with {confidence_percent}% confidence"),
        recommendation: if is_positive {
            POSITIVE_RECOMMENDATION
        } else {
            NEGATIVE_RECOMMENDATION
        },
    }
}

fn whole_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
