//! Shared utilities for the Noriba ride-dispatch application.
//!
//! This crate provides logging setup and time utilities used by both
//! the server and the client binaries.

pub mod logger;
pub mod time;
