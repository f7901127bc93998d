//! Authentication adapters.
//!
//! Implementations of the `TokenVerifier` and `TokenIssuer` ports:
//!
//! - `jwt` - HS256 shared-secret tokens
//! - `mock` - Fixed token map for tests

mod jwt;
mod mock;

pub use jwt::JwtTokenService;
pub use mock::MockTokenVerifier;
