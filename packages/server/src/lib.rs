//! Ride-dispatch and live-tracking server library.
//!
//! This library implements the dispatch engine for Noriba: the ride request
//! lifecycle state machine, the fan-out model that delivers requests to
//! online drivers and delivers location/status events to the requesting
//! user, and the concurrency control that guarantees at most one driver
//! wins a given request.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
