//! Bearer credential verification port.
//!
//! Stateless: the result depends only on the token string (and the clock).
//! Used by both the streaming handshake and the HTTP auth middleware.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, SubjectId};

/// Verifies a bearer token and extracts its subject.
///
/// # Contract
///
/// Implementations must:
/// - Receive the raw token, without any `Bearer ` prefix
/// - Return `AuthError::InvalidToken` for malformed or badly signed tokens
/// - Return `AuthError::TokenExpired` for expired tokens
/// - Return `AuthError::ServiceUnavailable` for transient failures
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<SubjectId, AuthError>;
}
