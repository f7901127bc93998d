//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `CONVERSATION_GATEWAY`
//! prefix and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use conversation_gateway::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod server;
mod streaming;

pub use auth::{AuthConfig, MIN_PRODUCTION_SECRET_BYTES};
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use streaming::StreamingConfig;

use serde::Deserialize;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CONVERSATION_GATEWAY";

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL; `None` selects the in-memory stores
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    pub auth: AuthConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads variables with the `CONVERSATION_GATEWAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// - `CONVERSATION_GATEWAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CONVERSATION_GATEWAY__AUTH__JWT_SECRET=...` -> `auth.jwt_secret = ...`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.auth.validate(self.server.environment)?;
        self.streaming.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "CONVERSATION_GATEWAY__AUTH__JWT_SECRET",
        "CONVERSATION_GATEWAY__SERVER__PORT",
        "CONVERSATION_GATEWAY__SERVER__ENVIRONMENT",
        "CONVERSATION_GATEWAY__DATABASE__URL",
        "CONVERSATION_GATEWAY__STREAMING__CHUNK_SIZE",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let result = f();
        clear_env();
        result
    }

    #[test]
    fn test_load_minimal_environment() {
        let config = with_env(
            &[("CONVERSATION_GATEWAY__AUTH__JWT_SECRET", "dev-secret")],
            AppConfig::load,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.database.is_none());
        assert_eq!(config.streaming.chunk_size, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_nested_values() {
        let config = with_env(
            &[
                ("CONVERSATION_GATEWAY__AUTH__JWT_SECRET", "dev-secret"),
                ("CONVERSATION_GATEWAY__SERVER__PORT", "9090"),
                ("CONVERSATION_GATEWAY__DATABASE__URL", "postgres://localhost/gateway"),
                ("CONVERSATION_GATEWAY__STREAMING__CHUNK_SIZE", "8"),
            ],
            AppConfig::load,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert!(config.database.is_some());
        assert_eq!(config.streaming.chunk_size, 8);
    }

    #[test]
    fn test_missing_secret_fails_to_load() {
        let result = with_env(&[], AppConfig::load);
        assert!(result.is_err());
    }

    #[test]
    fn test_production_requires_long_secret() {
        let config = with_env(
            &[
                ("CONVERSATION_GATEWAY__AUTH__JWT_SECRET", "short"),
                ("CONVERSATION_GATEWAY__SERVER__ENVIRONMENT", "production"),
            ],
            AppConfig::load,
        )
        .unwrap();

        assert!(config.is_production());
        assert_eq!(
            config.validate(),
            Err(ValidationError::JwtSecretTooShort(32))
        );
    }
}
