use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Local};

use super::commands::Command;
use crate::backend::Backend;
use crate::config::Config;
use crate::error::PredictionError;
use crate::flow::Orchestrator;
use crate::indicator::{IndicatorTick, ProcessingIndicator};
use crate::prediction::{BackendAvailability, PredictionResult};
use crate::ui::terminal::TerminalView;

/// Events delivered to the event loop, from the input reader and from
/// background tasks.
#[derive(Debug)]
pub enum AppEvent {
    Command(Command),
    InvalidInput(String),
    InputClosed,
    HealthChecked {
        session: u64,
        availability: BackendAvailability,
    },
    PredictionComplete {
        session: u64,
        ticket: u64,
        outcome: Result<PredictionResult, PredictionError>,
    },
    IndicatorTick(IndicatorTick),
}

/// How the session was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Commands come from stdin until `quit`.
    Interactive,
    /// Analyze the opened scan as soon as the backend is known, then exit.
    OneShot,
}

/// Why the event loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    Verdict,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A transient user-facing message.
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub at: DateTime<Local>,
}

/// Central application state. Lives on the event-loop thread inside Rc<RefCell<>>.
pub struct AppState {
    pub config: Config,
    pub backend: Backend,
    pub mode: SessionMode,
    pub sender: async_channel::Sender<AppEvent>,

    /// Bumped on every reload so late events from an old session are dropped.
    pub session: u64,
    pub flow: Orchestrator,
    pub indicator: ProcessingIndicator,
    pub last_tick: Option<IndicatorTick>,

    /// Only the latest notification is kept.
    pub notification: Option<Notification>,
    pub finished: Option<SessionEnd>,

    // Terminal output; None when driven headless
    pub view: Option<TerminalView>,
}

impl AppState {
    pub fn new(
        config: Config,
        mode: SessionMode,
        sender: async_channel::Sender<AppEvent>,
    ) -> Self {
        let backend = Backend::from_config(&config);
        Self {
            config,
            backend,
            mode,
            sender,
            session: 0,
            flow: Orchestrator::new(),
            indicator: ProcessingIndicator::new(),
            last_tick: None,
            notification: None,
            finished: None,
            view: None,
        }
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }
}

/// Record a notification and show it.
pub fn notify(
    state: &Rc<RefCell<AppState>>,
    level: NotificationLevel,
    title: &str,
    message: &str,
) {
    let notification = Notification {
        level,
        title: title.to_string(),
        message: message.to_string(),
        at: Local::now(),
    };
    let mut s = state.borrow_mut();
    if let Some(ref view) = s.view {
        view.show_notification(&notification);
    }
    s.notification = Some(notification);
}

/// Stop the event loop after the current event.
pub fn finish(state: &Rc<RefCell<AppState>>, end: SessionEnd) {
    let mut s = state.borrow_mut();
    if s.finished.is_none() {
        log::info!("Session finished: {end:?}");
        s.finished = Some(end);
    }
}
