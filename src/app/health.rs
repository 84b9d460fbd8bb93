use std::cell::RefCell;
use std::rc::Rc;

use super::pipeline::hide_indicator;
use super::state::{AppEvent, AppState};

/// Begin a session: probe the backend once. The result arrives as
/// `AppEvent::HealthChecked`.
pub fn start_session(state: &Rc<RefCell<AppState>>) {
    let s = state.borrow();
    let backend = s.backend.clone();
    let sender = s.sender.clone();
    let session = s.session;
    log::info!("Session {session}: checking backend {}", backend.describe());

    if let Some(ref view) = s.view {
        view.show_status_line(&format!("Checking backend {}...", backend.describe()));
    }

    tokio::spawn(async move {
        let availability = backend.check_health().await;
        let _ = sender
            .send(AppEvent::HealthChecked {
                session,
                availability,
            })
            .await;
    });
}

/// Throw away the current session and start a new one, as a page reload would.
pub fn reload_session(state: &Rc<RefCell<AppState>>) {
    hide_indicator(state);
    {
        let mut s = state.borrow_mut();
        s.flow.reset();
        let next = s.flow.successor();
        s.flow = next;
        s.session += 1;
    }
    start_session(state);
}
