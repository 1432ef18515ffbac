//! Identity verification at the connection boundary.
//!
//! Every WebSocket upgrade and HTTP request carries a token; the verifier
//! turns it into an [`Identity`] (party id + role) before any handler
//! logic runs. Party ids in message payloads are never trusted; the
//! verified identity is the only source.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{PartyId, Role};

/// Verified party identity
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub party_id: PartyId,
    pub role: Role,
}

/// Identity verification errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,
    #[error("malformed token")]
    MalformedToken,
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("invalid party id: {0}")]
    InvalidPartyId(String),
}

/// Token verifier trait
///
/// 本番環境では外部の認証基盤（JWT 検証など）を実装する。
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Development token verifier
///
/// `<role>:<party_id>` 形式のトークンをそのまま識別情報として扱う。
/// 署名検証は行わないため、ローカル開発とテスト専用。
pub struct DevTokenVerifier;

impl DevTokenVerifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DevTokenVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityVerifier for DevTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let (role_str, id_str) = token
            .split_once(':')
            .ok_or(AuthError::MalformedToken)?;
        let role = Role::parse(role_str)
            .map_err(|_| AuthError::UnknownRole(role_str.to_string()))?;
        let party_id = PartyId::new(id_str.to_string())
            .map_err(|e| AuthError::InvalidPartyId(e.to_string()))?;
        Ok(Identity { party_id, role })
    }
}
