//! HTTP adapter for message endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{MessageApiError, MessageAppState};
pub use routes::{message_router, message_routes};
