//! Error types for the ride dispatch client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Token was rejected by the server
    #[error("Authentication rejected for token '{0}'")]
    AuthRejected(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
