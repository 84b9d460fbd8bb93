mod commands;
mod event_handler;
mod health;
mod pipeline;
mod state;

use std::cell::RefCell;
use std::rc::Rc;

use tokio::io::{AsyncBufReadExt, BufReader};

pub use commands::{Command, HELP};
pub use event_handler::handle_event;
pub use health::{reload_session, start_session};
pub use state::{
    AppEvent, AppState, Notification, NotificationLevel, SessionEnd, SessionMode,
};

/// Drive the state machine until a handler finishes the session.
pub async fn run(
    state: &Rc<RefCell<AppState>>,
    events: async_channel::Receiver<AppEvent>,
) -> SessionEnd {
    while let Ok(event) = events.recv().await {
        handle_event(state, event);
        if let Some(end) = state.borrow().finished {
            return end;
        }
    }
    SessionEnd::Quit
}

/// Forward stdin lines to the event loop as commands.
pub fn spawn_input_reader(sender: async_channel::Sender<AppEvent>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let event = match Command::parse(&line) {
                        Ok(Some(command)) => AppEvent::Command(command),
                        Ok(None) => continue,
                        Err(message) => AppEvent::InvalidInput(message),
                    };
                    if sender.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    let _ = sender.send(AppEvent::InputClosed).await;
                    break;
                }
                Err(e) => {
                    log::error!("Failed to read input: {e}");
                    let _ = sender.send(AppEvent::InputClosed).await;
                    break;
                }
            }
        }
    });
}
