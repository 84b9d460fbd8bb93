use crate::app::{AppState, Notification, NotificationLevel};
use crate::indicator::{IndicatorPhase, IndicatorTick};
use crate::prediction::HealthReport;
use crate::upload::UploadedAsset;
use crate::verdict::DisplayVerdict;

const BAR_WIDTH: usize = 25;

/// Plain stdout renderer for the session.
#[derive(Debug, Default)]
pub struct TerminalView;

impl TerminalView {
    pub fn new() -> Self {
        Self
    }

    pub fn show_status_line(&self, text: &str) {
        println!("{text}");
    }

    pub fn show_notification(&self, n: &Notification) {
        let marker = match n.level {
            NotificationLevel::Info => "i",
            NotificationLevel::Success => "+",
            NotificationLevel::Error => "!",
        };
        println!("[{}] {marker} {}: {}", n.at.format("%H:%M:%S"), n.title, n.message);
    }

    pub fn show_state(&self, state: &AppState) {
        println!("Backend:  {} ({})", state.backend.describe(), state.flow.availability());
        println!("State:    {:?}", state.flow.state());
        if let Some(asset) = state.flow.asset() {
            println!("Scan:     {} ({})", asset.file_name(), asset.size_label());
            println!("Preview:  {}", asset.preview_url());
        }
        if let Some(tick) = state.last_tick {
            println!("Progress: {}% ({})", tick.progress, tick.phase.title());
        }
        if let Some(result) = state.flow.result() {
            println!(
                "Result:   {} ({:.2}% confidence)",
                result.label, result.confidence_percent
            );
        }
    }

    /// Print the phase list when the phase changes, and the bar every 10%.
    pub fn show_progress(&self, tick: &IndicatorTick, previous: Option<&IndicatorTick>) {
        if previous.map(|p| p.phase) != Some(tick.phase) {
            let current = IndicatorPhase::ALL
                .iter()
                .position(|p| *p == tick.phase)
                .unwrap_or(0);
            for (i, phase) in IndicatorPhase::ALL.iter().enumerate() {
                let mark = if i < current {
                    "x"
                } else if i == current {
                    ">"
                } else {
                    " "
                };
                println!("  [{mark}] {}: {}", phase.title(), phase.description());
            }
        }
        if tick.progress % 10 == 0 {
            let filled = usize::from(tick.progress) * BAR_WIDTH / 100;
            println!(
                "  Processing Progress [{}{}] {}%",
                "#".repeat(filled),
                "-".repeat(BAR_WIDTH - filled),
                tick.progress
            );
        }
    }

    pub fn show_verdict(&self, verdict: &DisplayVerdict, asset: Option<&UploadedAsset>) {
        println!();
        println!("  {}", verdict.headline);
        println!("  {}", verdict.summary);
        println!("  Pneumonia probability: {}%", verdict.probability_percent);
        println!(
            "  Confidence:            {}% ({})",
            verdict.confidence_percent,
            verdict.confidence_band.label()
        );
        println!("  {}", verdict.recommendation);
        if let Some(asset) = asset {
            println!("  Image: {}", asset.preview_url());
        }
        println!();
    }

    pub fn show_health(&self, origin: &str, report: &HealthReport) {
        println!("Backend:      {origin}");
        println!("Status:       {}", report.status);
        println!("Message:      {}", report.message);
        println!("Model loaded: {}", report.model_loaded);
    }
}
