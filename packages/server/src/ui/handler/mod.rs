//! HTTP and WebSocket request handlers.

mod http;
mod websocket;

pub use http::{cancel_ride, debug_rides, get_active_rides, health_check, submit_ride};
pub use websocket::websocket_handler;
