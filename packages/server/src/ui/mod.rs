//! Ride dispatch server implementation.

pub mod auth;
mod handler;
mod server;
mod signal;
pub mod state;

pub use auth::{DevTokenVerifier, Identity, IdentityVerifier};
pub use server::Server;
