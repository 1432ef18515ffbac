//! CLI client library for the Noriba ride dispatch service.
//!
//! Connects to the dispatch server over WebSocket as either a user or a
//! driver, turns line-oriented commands into wire messages, and renders
//! incoming events for the terminal.

pub mod command;
pub mod domain;
pub mod error;
pub mod formatter;
mod runner;
mod session;
mod ui;

pub use domain::{Profile, Role};
pub use error::ClientError;
pub use runner::run_client;
