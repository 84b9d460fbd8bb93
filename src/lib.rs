//! Client for a CT-scan pneumonia detection backend.
//!
//! A scan is captured ([`upload`]), sent to the backend ([`client`], or the
//! offline [`simulator`]) while a cosmetic progress display runs
//! ([`indicator`]), and the prediction is turned into a verdict
//! ([`verdict`]). [`flow`] sequences the cycle; [`app`] drives it from
//! user commands and background events.

pub mod app;
pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod flow;
pub mod indicator;
pub mod prediction;
pub mod simulator;
pub mod ui;
pub mod upload;
pub mod verdict;
