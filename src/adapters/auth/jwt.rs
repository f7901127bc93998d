//! HS256 JWT token service.
//!
//! Verifies bearer credentials for both the streaming handshake and the HTTP
//! routes, and signs access tokens. Only `sub` and `exp` are required; the
//! subject is the only claim that leaves this module.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, SubjectId};
use crate::ports::{TokenIssuer, TokenVerifier};

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    /// Subject - the principal id
    sub: String,

    /// Expiry timestamp (Unix epoch seconds)
    exp: i64,

    /// Issued at timestamp
    #[serde(default)]
    iat: Option<i64>,
}

/// Signs and verifies HS256 access tokens with a shared secret.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_ttl_secs: i64,
    leeway_secs: u64,
}

impl JwtTokenService {
    pub fn new(secret: &SecretString, access_token_ttl_secs: u64, leeway_secs: u64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            access_token_ttl_secs: i64::try_from(access_token_ttl_secs).unwrap_or(i64::MAX),
            leeway_secs,
        }
    }

    fn sign(&self, claims: &AccessClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign access token: {}", e);
            AuthError::service_unavailable("token signing failed")
        })
    }
}

impl std::fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenService")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenService {
    async fn verify(&self, token: &str) -> Result<SubjectId, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway_secs;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<AccessClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::debug!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            }
        })?;

        SubjectId::new(data.claims.sub).map_err(|_| AuthError::InvalidToken)
    }
}

#[async_trait]
impl TokenIssuer for JwtTokenService {
    async fn issue_access_token(&self, subject: &SubjectId) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        self.sign(&AccessClaims {
            sub: subject.as_str().to_string(),
            exp: now.saturating_add(self.access_token_ttl_secs),
            iat: Some(now),
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<String, AuthError> {
        Err(AuthError::unsupported("token refresh"))
    }
}
