//! Authentication types for the domain layer.
//!
//! A verified bearer credential reduces to a [`SubjectId`]; nothing else from
//! the token travels past the adapter that checked it. The subject flows as
//! an explicit value through every call that needs it.

use super::SubjectId;
use thiserror::Error;

/// Principal extracted from a validated bearer token.
///
/// Injected into request extensions by the HTTP auth middleware and
/// bound into the [`Session`](crate::domain::conversation::Session) of a
/// streaming connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubject {
    pub id: SubjectId,
}

impl AuthenticatedSubject {
    pub fn new(id: SubjectId) -> Self {
        Self { id }
    }
}

/// Authentication errors that can occur during token validation or issuance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential was supplied.
    #[error("Missing token")]
    MissingToken,

    /// The token is malformed or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The requested operation is disabled in this deployment.
    #[error("Operation not supported: {0}")]
    Unsupported(String),

    /// Signing or verification infrastructure failed.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported(operation.into())
    }

    /// Returns true if this error indicates the client should re-authenticate.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::TokenExpired
        )
    }
}
