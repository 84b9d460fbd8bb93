use std::cell::RefCell;
use std::rc::Rc;

use super::state::{AppEvent, AppState};
use crate::flow::AnalysisRequest;

/// Issue the prediction on the runtime; the outcome comes back as
/// `AppEvent::PredictionComplete`.
pub fn dispatch_prediction(state: &Rc<RefCell<AppState>>, request: AnalysisRequest) {
    let s = state.borrow();
    let backend = s.backend.clone();
    let sender = s.sender.clone();
    let session = s.session;

    tokio::spawn(async move {
        let outcome = backend.predict(&request.upload).await;
        if let Err(ref e) = outcome {
            log::warn!("Prediction for ticket {} failed: {e}", request.ticket);
        }
        let _ = sender
            .send(AppEvent::PredictionComplete {
                session,
                ticket: request.ticket,
                outcome,
            })
            .await;
    });
}

/// Start the cosmetic progress display, forwarding ticks to the event loop.
pub fn show_indicator(state: &Rc<RefCell<AppState>>) {
    let mut s = state.borrow_mut();
    let sender = s.sender.clone();
    s.last_tick = None;
    s.indicator.show(move |tick| {
        let _ = sender.try_send(AppEvent::IndicatorTick(tick));
    });
}

pub fn hide_indicator(state: &Rc<RefCell<AppState>>) {
    let mut s = state.borrow_mut();
    s.indicator.hide();
    s.last_tick = None;
}
