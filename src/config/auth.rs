//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Shortest HS256 secret accepted in production.
pub const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

/// Bearer token settings (HS256 JWT)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC signing secret
    pub jwt_secret: SecretString,

    /// Lifetime of issued access tokens
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: u64,

    /// Clock skew tolerated when checking `exp`
    #[serde(default)]
    pub leeway_secs: u64,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: SecretString::new(jwt_secret.into()),
            access_token_ttl_secs: default_access_token_ttl(),
            leeway_secs: 0,
        }
    }

    /// Validate authentication configuration
    ///
    /// Production requires a secret of at least [`MIN_PRODUCTION_SECRET_BYTES`].
    pub fn validate(&self, environment: Environment) -> Result<(), ValidationError> {
        let secret_len = self.jwt_secret.expose_secret().len();
        if secret_len == 0 {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if environment == Environment::Production && secret_len < MIN_PRODUCTION_SECRET_BYTES {
            return Err(ValidationError::JwtSecretTooShort(
                MIN_PRODUCTION_SECRET_BYTES,
            ));
        }
        if self.access_token_ttl_secs == 0 {
            return Err(ValidationError::InvalidTokenTtl);
        }
        Ok(())
    }
}

fn default_access_token_ttl() -> u64 {
    900
}
