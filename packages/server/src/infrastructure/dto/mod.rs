//! Data Transfer Objects (DTOs) for the ride-dispatch application.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs (the closed set of typed event schemas)
//! - `http`: HTTP API request/response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
