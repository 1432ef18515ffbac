//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use crate::error::ClientError;

/// Client-side view of the connection role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Driver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Driver => "driver",
        }
    }
}

/// Rider profile sent along with requests and accepts
///
/// サーバーは identity をトークンから取るため、ここにあるのは
/// 表示用のメタデータだけ。
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub phone: String,
}

/// Derive the role from a `<role>:<party_id>` token.
///
/// # Arguments
///
/// * `token` - The identity token passed on the command line
///
/// # Returns
///
/// The role half of the token, or `None` if the token is malformed
pub fn parse_role_from_token(token: &str) -> Option<Role> {
    match token.split_once(':')?.0 {
        "user" => Some(Role::User),
        "driver" => Some(Role::Driver),
        _ => None,
    }
}

/// Check if the client should exit immediately based on the error type.
///
/// # Arguments
///
/// * `error` - The client error to check
///
/// # Returns
///
/// `true` if the error requires immediate exit (e.g., AuthRejected),
/// `false` otherwise
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::AuthRejected(_))
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
///
/// # Returns
///
/// `true` if reconnection should be attempted, `false` otherwise
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    // Don't reconnect if the error requires immediate exit
    if should_exit_immediately(error) {
        return false;
    }

    // Don't reconnect if we've exhausted all attempts
    current_attempt < max_attempts
}
