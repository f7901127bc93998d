//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - JWT token service, mock verifier
//! - `memory` / `postgres` - conversation and turn stores
//! - `reply` - templated reply generator
//! - `http` - REST routes and auth middleware
//! - `websocket` - streaming protocol endpoint

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod reply;
pub mod websocket;

pub use auth::{JwtTokenService, MockTokenVerifier};
pub use memory::{InMemoryConversationStore, InMemoryMessageStore};
pub use postgres::{PostgresConversationStore, PostgresMessageStore};
pub use reply::EchoReplyGenerator;
pub use websocket::{SessionRegistry, StreamingState};
