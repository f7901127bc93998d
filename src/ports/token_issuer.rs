//! Access token issuance port.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, SubjectId};

/// Signs access tokens for a subject.
///
/// Refresh is part of the interface but may be disabled; a disabled refresh
/// returns `AuthError::Unsupported` rather than failing deeper down.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Issue a short-lived access token for `subject`.
    async fn issue_access_token(&self, subject: &SubjectId) -> Result<String, AuthError>;

    /// Exchange a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError>;
}
