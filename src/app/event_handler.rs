use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use super::commands::{Command, HELP};
use super::health::reload_session;
use super::pipeline::{dispatch_prediction, hide_indicator, show_indicator};
use super::state::{
    finish, notify, AppEvent, AppState, NotificationLevel, SessionEnd, SessionMode,
};
use crate::error::PredictionError;
use crate::flow::Completion;
use crate::indicator::IndicatorTick;
use crate::prediction::{BackendAvailability, PredictionResult};
use crate::upload::read_scan;
use crate::verdict;

/// Handle one event. This is the core state machine of the front end.
pub fn handle_event(state: &Rc<RefCell<AppState>>, event: AppEvent) {
    match event {
        AppEvent::Command(command) => handle_command(state, command),
        AppEvent::InvalidInput(message) => {
            if let Some(ref view) = state.borrow().view {
                view.show_status_line(&message);
            }
        }
        AppEvent::InputClosed => {
            log::info!("Input closed");
            finish(state, SessionEnd::Quit);
        }
        AppEvent::HealthChecked {
            session,
            availability,
        } => {
            if session != state.borrow().session {
                log::debug!("Ignoring health report from session {session}");
                return;
            }
            on_health_checked(state, availability);
        }
        AppEvent::PredictionComplete {
            session,
            ticket,
            outcome,
        } => {
            if session != state.borrow().session {
                log::info!("Ignoring prediction from old session {session}");
                return;
            }
            on_prediction_complete(state, ticket, outcome);
        }
        AppEvent::IndicatorTick(tick) => on_indicator_tick(state, tick),
    }
}

fn handle_command(state: &Rc<RefCell<AppState>>, command: Command) {
    match command {
        Command::Open(path) => open_scan(state, &path),
        Command::Analyze => start_analysis(state),
        Command::Reset => {
            hide_indicator(state);
            state.borrow_mut().flow.reset();
            notify(state, NotificationLevel::Info, "Reset", "Ready for a new scan.");
        }
        Command::Reload => {
            log::info!("Reloading session");
            reload_session(state);
        }
        Command::Status => {
            let s = state.borrow();
            if let Some(ref view) = s.view {
                view.show_state(&s);
            }
        }
        Command::Help => {
            if let Some(ref view) = state.borrow().view {
                view.show_status_line(HELP);
            }
        }
        Command::Quit => finish(state, SessionEnd::Quit),
    }
}

fn open_scan(state: &Rc<RefCell<AppState>>, path: &Path) {
    let (name, bytes) = match read_scan(path) {
        Ok(scan) => scan,
        Err(e) => {
            log::error!("Cannot open scan: {e}");
            notify(state, NotificationLevel::Error, "Cannot open scan", &e.to_string());
            end_one_shot(state, SessionEnd::Failed);
            return;
        }
    };

    let selected = {
        let mut s = state.borrow_mut();
        s.flow.select_file(&name, bytes).map(|asset| {
            format!(
                "{} ({}) preview: {}",
                asset.file_name(),
                asset.size_label(),
                asset.preview_url()
            )
        })
    };

    match selected {
        Ok(summary) => {
            notify(state, NotificationLevel::Info, "Scan selected", &summary);
            // The backend may already be known by the time the file is open.
            let ready = state.borrow().flow.availability() != BackendAvailability::Unknown;
            if ready && state.borrow().mode == SessionMode::OneShot {
                start_analysis(state);
            }
        }
        Err(e) => {
            log::error!("Cannot select scan: {e}");
            notify(state, NotificationLevel::Error, "Cannot select scan", &e.to_string());
            end_one_shot(state, SessionEnd::Failed);
        }
    }
}

fn start_analysis(state: &Rc<RefCell<AppState>>) {
    let request = state.borrow_mut().flow.start_analysis();
    match request {
        Ok(request) => {
            log::info!("Starting analysis of {}", request.upload.file_name);
            show_indicator(state);
            if let Some(ref view) = state.borrow().view {
                view.show_status_line("Analyzing your CT scan...");
            }
            dispatch_prediction(state, request);
        }
        Err(e) => {
            log::warn!("Analysis refused: {e}");
            notify(state, NotificationLevel::Error, "Cannot start analysis", &e.to_string());
            end_one_shot(state, SessionEnd::Failed);
        }
    }
}

fn on_health_checked(state: &Rc<RefCell<AppState>>, availability: BackendAvailability) {
    if !state.borrow_mut().flow.record_health(availability) {
        return;
    }

    match availability {
        BackendAvailability::Available => {
            let origin = state.borrow().backend.describe();
            notify(
                state,
                NotificationLevel::Success,
                "Backend connected",
                &format!("Prediction backend at {origin} is ready."),
            );
        }
        _ => {
            notify(
                state,
                NotificationLevel::Error,
                "Backend unavailable",
                "Start the backend server, then reload. Analysis is disabled for this session.",
            );
        }
    }

    let pending_scan = state.borrow().flow.asset().is_some();
    if state.borrow().mode == SessionMode::OneShot && pending_scan {
        start_analysis(state);
    }
}

fn on_prediction_complete(
    state: &Rc<RefCell<AppState>>,
    ticket: u64,
    outcome: Result<PredictionResult, PredictionError>,
) {
    let completion = state.borrow_mut().flow.complete_analysis(ticket, outcome);
    match completion {
        Completion::Done(result) => {
            hide_indicator(state);
            let verdict = verdict::render(&result);
            {
                let s = state.borrow();
                if let Some(ref view) = s.view {
                    view.show_verdict(&verdict, s.flow.asset());
                }
            }
            notify(state, NotificationLevel::Success, "Analysis complete", &verdict.summary);
            end_one_shot(state, SessionEnd::Verdict);
        }
        Completion::Failed(err) => {
            hide_indicator(state);
            notify(state, NotificationLevel::Error, "Analysis failed", &err.to_string());
            end_one_shot(state, SessionEnd::Failed);
        }
        Completion::Stale => {}
    }
}

fn on_indicator_tick(state: &Rc<RefCell<AppState>>, tick: IndicatorTick) {
    let mut s = state.borrow_mut();
    if !s.indicator.is_current(&tick) {
        return;
    }
    let previous = s.last_tick.replace(tick);
    if let Some(ref view) = s.view {
        view.show_progress(&tick, previous.as_ref());
    }
}

fn end_one_shot(state: &Rc<RefCell<AppState>>, end: SessionEnd) {
    if state.borrow().mode == SessionMode::OneShot {
        finish(state, end);
    }
}
