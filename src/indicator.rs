use std::time::Duration;

use tokio::task::JoinHandle;

/// Time between progress ticks.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Progress added per tick.
pub const STEP: u8 = 2;

const AI_PROCESSING_AT: u8 = 33;
const RESULTS_READY_AT: u8 = 66;
const COMPLETE: u8 = 100;

/// Cosmetic analysis phase shown while a prediction is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorPhase {
    ImageAnalysis,
    AiProcessing,
    ResultsReady,
}

impl IndicatorPhase {
    pub const ALL: [IndicatorPhase; 3] = [
        IndicatorPhase::ImageAnalysis,
        IndicatorPhase::AiProcessing,
        IndicatorPhase::ResultsReady,
    ];

    pub fn for_progress(progress: u8) -> Self {
        if progress >= RESULTS_READY_AT {
            IndicatorPhase::ResultsReady
        } else if progress >= AI_PROCESSING_AT {
            IndicatorPhase::AiProcessing
        } else {
            IndicatorPhase::ImageAnalysis
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            IndicatorPhase::ImageAnalysis => "Image Analysis",
            IndicatorPhase::AiProcessing => "AI Processing",
            IndicatorPhase::ResultsReady => "Results Ready",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            IndicatorPhase::ImageAnalysis => "Scanning CT image data...",
            IndicatorPhase::AiProcessing => "Deep learning analysis...",
            IndicatorPhase::ResultsReady => "Analysis complete!",
        }
    }
}

/// Progress counter, 0..=100 in steps of [`STEP`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress(u8);

impl Progress {
    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn phase(&self) -> IndicatorPhase {
        IndicatorPhase::for_progress(self.0)
    }

    pub fn is_complete(&self) -> bool {
        self.0 >= COMPLETE
    }

    /// Advance one step, saturating at 100.
    pub fn advance(&mut self) {
        self.0 = self.0.saturating_add(STEP).min(COMPLETE);
    }
}

/// One delivered tick. `generation` identifies the `show` call that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorTick {
    pub generation: u64,
    pub progress: u8,
    pub phase: IndicatorPhase,
}

/// Owns the ticking task behind the progress display.
///
/// Each `show` aborts any previous task and starts over from 0. `hide` and
/// drop abort the task. Ticks already queued by the receiver can be filtered
/// with [`ProcessingIndicator::is_current`], which only accepts ticks from the
/// generation that is visible right now.
#[derive(Debug, Default)]
pub struct ProcessingIndicator {
    generation: u64,
    visible: bool,
    task: Option<JoinHandle<()>>,
}

impl ProcessingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking from 0. Must be called within a tokio runtime.
    pub fn show<F>(&mut self, mut on_tick: F) -> u64
    where
        F: FnMut(IndicatorTick) + Send + 'static,
    {
        self.stop_task();
        self.generation += 1;
        self.visible = true;
        let generation = self.generation;

        self.task = Some(tokio::spawn(async move {
            let mut progress = Progress::default();
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            // First tick resolves immediately.
            interval.tick().await;
            while !progress.is_complete() {
                interval.tick().await;
                progress.advance();
                on_tick(IndicatorTick {
                    generation,
                    progress: progress.value(),
                    phase: progress.phase(),
                });
            }
            log::debug!("Indicator generation {generation} reached 100%");
        }));
        generation
    }

    /// Stop ticking and reject any tick still in flight.
    pub fn hide(&mut self) {
        if self.visible {
            log::debug!("Hiding indicator generation {}", self.generation);
        }
        self.visible = false;
        self.stop_task();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the ticking task is still scheduled.
    pub fn is_ticking(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn is_current(&self, tick: &IndicatorTick) -> bool {
        self.visible && tick.generation == self.generation
    }

    fn stop_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ProcessingIndicator {
    fn drop(&mut self) {
        self.stop_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<IndicatorTick>>>, impl FnMut(IndicatorTick) + Send) {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let sink = ticks.clone();
        (ticks, move |t| sink.lock().unwrap().push(t))
    }

    #[test]
    fn phase_thresholds() {
        assert_eq!(IndicatorPhase::for_progress(0), IndicatorPhase::ImageAnalysis);
        assert_eq!(IndicatorPhase::for_progress(32), IndicatorPhase::ImageAnalysis);
        assert_eq!(IndicatorPhase::for_progress(33), IndicatorPhase::AiProcessing);
        assert_eq!(IndicatorPhase::for_progress(65), IndicatorPhase::AiProcessing);
        assert_eq!(IndicatorPhase::for_progress(66), IndicatorPhase::ResultsReady);
        assert_eq!(IndicatorPhase::for_progress(100), IndicatorPhase::ResultsReady);
    }

    #[test]
    fn progress_saturates_at_100() {
        let mut p = Progress::default();
        for _ in 0..60 {
            p.advance();
        }
        assert_eq!(p.value(), 100);
        assert!(p.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_stop_at_100() {
        let (ticks, sink) = recorder();
        let mut indicator = ProcessingIndicator::new();
        indicator.show(sink);

        tokio::time::sleep(Duration::from_secs(10)).await;
        {
            let ticks = ticks.lock().unwrap();
            assert_eq!(ticks.len(), 50);
            assert_eq!(ticks.first().unwrap().progress, 2);
            assert_eq!(ticks.last().unwrap().progress, 100);
            assert_eq!(ticks.last().unwrap().phase, IndicatorPhase::ResultsReady);
            assert!(ticks.windows(2).all(|w| w[1].progress == w[0].progress + STEP));
        }
        assert!(!indicator.is_ticking());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.lock().unwrap().len(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn hide_cancels_pending_ticks() {
        let (ticks, sink) = recorder();
        let mut indicator = ProcessingIndicator::new();
        indicator.show(sink);

        tokio::time::sleep(TICK_INTERVAL * 10 + Duration::from_millis(25)).await;
        assert_eq!(ticks.lock().unwrap().len(), 10);

        indicator.hide();
        assert!(!indicator.is_visible());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.lock().unwrap().len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn show_restarts_from_zero_and_rejects_old_generation() {
        let (ticks, sink) = recorder();
        let mut indicator = ProcessingIndicator::new();
        let first = indicator.show(sink);
        tokio::time::sleep(TICK_INTERVAL * 5 + Duration::from_millis(25)).await;
        let stale = *ticks.lock().unwrap().last().unwrap();
        assert_eq!(stale.generation, first);

        let (fresh_ticks, fresh_sink) = recorder();
        let second = indicator.show(fresh_sink);
        assert_ne!(first, second);
        assert!(!indicator.is_current(&stale));

        tokio::time::sleep(TICK_INTERVAL + Duration::from_millis(10)).await;
        let fresh = *fresh_ticks.lock().unwrap().first().unwrap();
        assert_eq!(fresh.progress, 2);
        assert!(indicator.is_current(&fresh));
        assert_eq!(ticks.lock().unwrap().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_the_task() {
        let (ticks, sink) = recorder();
        let mut indicator = ProcessingIndicator::new();
        indicator.show(sink);
        drop(indicator);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(ticks.lock().unwrap().is_empty());
    }
}
