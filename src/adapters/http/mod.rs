//! HTTP adapters - REST API implementations.
//!
//! - `middleware` - bearer authentication
//! - `message` - request/response exchange and history

pub mod message;
pub mod middleware;

pub use message::{message_router, MessageApiError, MessageAppState};
pub use middleware::{auth_middleware, AuthState, RequireAuth};
