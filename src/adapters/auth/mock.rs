//! Mock token verifier for testing.
//!
//! # Example
//!
//! ```ignore
//! use conversation_gateway::adapters::auth::MockTokenVerifier;
//!
//! let verifier = MockTokenVerifier::new().with_subject("validtoken", "17");
//! let subject = verifier.verify("validtoken").await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, SubjectId};
use crate::ports::TokenVerifier;

/// Maps fixed tokens to subjects. Tokens not in the map return `InvalidToken`.
#[derive(Debug, Default, Clone)]
pub struct MockTokenVerifier {
    tokens: HashMap<String, SubjectId>,
    force_error: Option<AuthError>,
}

impl MockTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `token` as belonging to `subject`.
    ///
    /// Blank subjects are ignored, since they could never come out of a real
    /// verifier.
    pub fn with_subject(mut self, token: impl Into<String>, subject: impl Into<String>) -> Self {
        if let Ok(subject) = SubjectId::new(subject) {
            self.tokens.insert(token.into(), subject);
        }
        self
    }

    /// Forces all verifications to return the specified error.
    pub fn with_error(mut self, error: AuthError) -> Self {
        self.force_error = Some(error);
        self
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

#[async_trait]
impl TokenVerifier for MockTokenVerifier {
    async fn verify(&self, token: &str) -> Result<SubjectId, AuthError> {
        if let Some(error) = &self.force_error {
            return Err(error.clone());
        }
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
