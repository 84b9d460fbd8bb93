use crate::error::{FlowError, PredictionError};
use crate::prediction::{BackendAvailability, PredictionResult, ScanUpload};
use crate::upload::UploadedAsset;

/// Externally visible stage of the upload → analysis → result cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Ready,
    Processing,
    Done,
}

/// Stage plus the data each stage owns. Keeping the asset and result inside
/// the variants makes "result only in Done, asset only outside Idle" hold by
/// construction.
#[derive(Debug, Default)]
enum Stage {
    #[default]
    Idle,
    Ready(UploadedAsset),
    Processing {
        asset: UploadedAsset,
        ticket: u64,
    },
    Done {
        asset: UploadedAsset,
        result: PredictionResult,
    },
}

impl Stage {
    fn asset(&self) -> Option<&UploadedAsset> {
        match self {
            Stage::Idle => None,
            Stage::Ready(asset) | Stage::Processing { asset, .. } | Stage::Done { asset, .. } => {
                Some(asset)
            }
        }
    }

    fn into_asset(self) -> Option<UploadedAsset> {
        match self {
            Stage::Idle => None,
            Stage::Ready(asset) | Stage::Processing { asset, .. } | Stage::Done { asset, .. } => {
                Some(asset)
            }
        }
    }
}

/// A prediction the caller must issue. Hand the outcome back to
/// [`Orchestrator::complete_analysis`] with the same ticket.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub ticket: u64,
    pub upload: ScanUpload,
}

/// What `complete_analysis` did with an outcome.
#[derive(Debug)]
pub enum Completion {
    /// Now in Done.
    Done(PredictionResult),
    /// Back in Ready with the asset kept for a retry.
    Failed(PredictionError),
    /// The ticket did not belong to the current cycle; nothing changed.
    Stale,
}

/// Owns the single flow state and the backend availability gate.
#[derive(Debug, Default)]
pub struct Orchestrator {
    stage: Stage,
    availability: BackendAvailability,
    next_ticket: u64,
    in_flight: Option<u64>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh orchestrator for a new session. Ticket numbering continues
    /// so an outcome from the old session can never match a new ticket.
    pub fn successor(&self) -> Self {
        Self {
            next_ticket: self.next_ticket,
            ..Self::default()
        }
    }

    pub fn state(&self) -> FlowState {
        match self.stage {
            Stage::Idle => FlowState::Idle,
            Stage::Ready(_) => FlowState::Ready,
            Stage::Processing { .. } => FlowState::Processing,
            Stage::Done { .. } => FlowState::Done,
        }
    }

    pub fn availability(&self) -> BackendAvailability {
        self.availability
    }

    pub fn asset(&self) -> Option<&UploadedAsset> {
        self.stage.asset()
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match &self.stage {
            Stage::Done { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Whether a dispatched prediction has not reported back yet.
    pub fn has_request_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Record the outcome of the startup health probe. Only the first report
    /// counts; later ones are ignored until a new orchestrator is created.
    pub fn record_health(&mut self, availability: BackendAvailability) -> bool {
        if self.availability != BackendAvailability::Unknown {
            log::warn!(
                "Ignoring health report ({availability}); already {}",
                self.availability
            );
            return false;
        }
        self.availability = availability;
        true
    }

    /// Capture a scan and move to Ready.
    ///
    /// Any existing asset is released first, and any result is cleared.
    /// Refused while Processing. If capture fails the flow ends up Idle.
    pub fn select_file(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<&UploadedAsset, FlowError> {
        if matches!(self.stage, Stage::Processing { .. }) {
            return Err(FlowError::AlreadyProcessing);
        }

        if let Some(previous) = std::mem::take(&mut self.stage).into_asset() {
            log::info!("Replacing {}", previous.file_name());
            previous.release();
        }

        let asset = UploadedAsset::capture(file_name, bytes)?;
        self.stage = Stage::Ready(asset);
        log::info!("Flow: Ready");
        self.stage.asset().ok_or(FlowError::NoAsset)
    }

    /// Move Ready → Processing and hand out the request to issue.
    ///
    /// Refused, with state unchanged, unless in Ready with the backend
    /// available and no earlier request still unresolved.
    pub fn start_analysis(&mut self) -> Result<AnalysisRequest, FlowError> {
        match self.stage {
            Stage::Idle => return Err(FlowError::NoAsset),
            Stage::Processing { .. } => return Err(FlowError::AlreadyProcessing),
            Stage::Done { .. } => return Err(FlowError::AlreadyComplete),
            Stage::Ready(_) => {}
        }
        if self.availability != BackendAvailability::Available {
            return Err(FlowError::BackendUnavailable(self.availability));
        }
        if self.in_flight.is_some() {
            return Err(FlowError::PreviousInFlight);
        }

        let Stage::Ready(asset) = std::mem::take(&mut self.stage) else {
            return Err(FlowError::NoAsset);
        };
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let upload = asset.to_upload();
        self.stage = Stage::Processing { asset, ticket };
        self.in_flight = Some(ticket);
        log::info!("Flow: Processing (ticket {ticket})");

        Ok(AnalysisRequest { ticket, upload })
    }

    /// Apply the outcome of the request issued under `ticket`.
    pub fn complete_analysis(
        &mut self,
        ticket: u64,
        outcome: Result<PredictionResult, PredictionError>,
    ) -> Completion {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }

        match std::mem::take(&mut self.stage) {
            Stage::Processing { asset, ticket: t } if t == ticket => match outcome {
                Ok(result) => {
                    self.stage = Stage::Done { asset, result };
                    log::info!("Flow: Done ({})", result.label);
                    Completion::Done(result)
                }
                Err(err) => {
                    self.stage = Stage::Ready(asset);
                    log::info!("Flow: back to Ready after failure");
                    Completion::Failed(err)
                }
            },
            other => {
                self.stage = other;
                log::info!("Discarding outcome of stale ticket {ticket}");
                Completion::Stale
            }
        }
    }

    /// Return to Idle, releasing the asset and dropping any result.
    pub fn reset(&mut self) {
        if let Some(asset) = std::mem::take(&mut self.stage).into_asset() {
            asset.release();
        }
        log::info!("Flow: Idle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::Diagnosis;

    fn available() -> Orchestrator {
        let mut flow = Orchestrator::new();
        assert!(flow.record_health(BackendAvailability::Available));
        flow
    }

    fn preview_path(flow: &Orchestrator) -> std::path::PathBuf {
        flow.asset().unwrap().preview_url().to_file_path().unwrap()
    }

    fn pneumonia() -> PredictionResult {
        PredictionResult::from_confidence(Diagnosis::Pneumonia, 87.5)
    }

    #[test]
    fn select_then_reset_returns_to_idle() {
        let mut flow = available();
        flow.select_file("scan.png", vec![1, 2, 3]).unwrap();
        assert_eq!(flow.state(), FlowState::Ready);
        let preview = preview_path(&flow);
        assert!(preview.exists());

        flow.reset();
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(flow.asset().is_none());
        assert!(flow.result().is_none());
        assert!(!preview.exists());
    }

    #[test]
    fn replacing_an_asset_releases_the_old_preview() {
        let mut flow = available();
        flow.select_file("first.png", vec![1]).unwrap();
        let first = preview_path(&flow);

        flow.select_file("second.png", vec![2]).unwrap();
        assert!(!first.exists());
        assert_eq!(flow.asset().unwrap().file_name(), "second.png");
        flow.reset();
    }

    #[test]
    fn start_is_refused_unless_backend_available() {
        for availability in [BackendAvailability::Unknown, BackendAvailability::Unavailable] {
            let mut flow = Orchestrator::new();
            flow.record_health(availability);
            flow.select_file("scan.png", vec![1]).unwrap();
            let err = flow.start_analysis().unwrap_err();
            assert!(matches!(err, FlowError::BackendUnavailable(a) if a == availability));
            assert_eq!(flow.state(), FlowState::Ready);
            assert!(!flow.has_request_in_flight());
            flow.reset();
        }
    }

    #[test]
    fn health_is_recorded_once() {
        let mut flow = Orchestrator::new();
        assert!(flow.record_health(BackendAvailability::Unavailable));
        assert!(!flow.record_health(BackendAvailability::Available));
        assert_eq!(flow.availability(), BackendAvailability::Unavailable);

        flow.reset();
        assert_eq!(flow.availability(), BackendAvailability::Unavailable);
    }

    #[test]
    fn start_without_asset_is_refused() {
        let mut flow = available();
        assert!(matches!(flow.start_analysis(), Err(FlowError::NoAsset)));
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[test]
    fn second_start_while_processing_has_no_effect() {
        let mut flow = available();
        flow.select_file("scan.png", vec![1]).unwrap();
        let request = flow.start_analysis().unwrap();
        assert_eq!(request.upload.file_name, "scan.png");
        assert_eq!(flow.state(), FlowState::Processing);

        assert!(matches!(flow.start_analysis(), Err(FlowError::AlreadyProcessing)));
        assert!(matches!(
            flow.select_file("other.png", vec![9]),
            Err(FlowError::AlreadyProcessing)
        ));
        assert_eq!(flow.state(), FlowState::Processing);
        assert_eq!(flow.asset().unwrap().file_name(), "scan.png");
        flow.reset();
    }

    #[test]
    fn success_moves_to_done() {
        let mut flow = available();
        flow.select_file("scan.png", vec![1]).unwrap();
        let request = flow.start_analysis().unwrap();

        let completion = flow.complete_analysis(request.ticket, Ok(pneumonia()));
        assert!(matches!(completion, Completion::Done(_)));
        assert_eq!(flow.state(), FlowState::Done);
        assert_eq!(flow.result(), Some(&pneumonia()));
        assert!(flow.asset().is_some());
        assert!(matches!(flow.start_analysis(), Err(FlowError::AlreadyComplete)));
        flow.reset();
    }

    #[test]
    fn failure_returns_to_ready_and_keeps_the_asset() {
        let mut flow = available();
        flow.select_file("scan.png", vec![1]).unwrap();
        let preview = preview_path(&flow);
        let request = flow.start_analysis().unwrap();

        let err = PredictionError::Http {
            status: 500,
            message: "model error".into(),
        };
        match flow.complete_analysis(request.ticket, Err(err)) {
            Completion::Failed(e) => assert_eq!(e.to_string(), "model error"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(flow.state(), FlowState::Ready);
        assert!(flow.result().is_none());
        assert!(preview.exists());

        let retry = flow.start_analysis().unwrap();
        assert_ne!(retry.ticket, request.ticket);
        flow.reset();
    }

    #[test]
    fn outcome_after_reset_is_stale_and_blocks_until_resolved() {
        let mut flow = available();
        flow.select_file("scan.png", vec![1]).unwrap();
        let request = flow.start_analysis().unwrap();
        flow.reset();

        flow.select_file("next.png", vec![2]).unwrap();
        assert!(matches!(flow.start_analysis(), Err(FlowError::PreviousInFlight)));

        let completion = flow.complete_analysis(request.ticket, Ok(pneumonia()));
        assert!(matches!(completion, Completion::Stale));
        assert_eq!(flow.state(), FlowState::Ready);
        assert!(flow.result().is_none());

        assert!(flow.start_analysis().is_ok());
        flow.reset();
    }

    #[test]
    fn successor_never_reuses_a_ticket() {
        let mut old = available();
        old.select_file("scan.png", vec![1]).unwrap();
        let request = old.start_analysis().unwrap();
        old.reset();

        let mut flow = old.successor();
        assert_eq!(flow.availability(), BackendAvailability::Unknown);
        assert!(!flow.has_request_in_flight());
        assert!(flow.record_health(BackendAvailability::Available));
        flow.select_file("next.png", vec![2]).unwrap();
        let next = flow.start_analysis().unwrap();
        assert!(next.ticket > request.ticket);

        let completion = flow.complete_analysis(request.ticket, Ok(pneumonia()));
        assert!(matches!(completion, Completion::Stale));
        assert_eq!(flow.state(), FlowState::Processing);
        flow.reset();
    }
}
