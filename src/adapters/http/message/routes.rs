//! Axum routes for message endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{get_history, send_message, MessageAppState};

/// Creates routes for message endpoints.
///
/// - POST /message/:conversation_id/send_message - Request/response exchange
/// - GET /message/:conversation_id/history - Paged, paired history
pub fn message_routes() -> Router<MessageAppState> {
    Router::new()
        .route("/message/:conversation_id/send_message", post(send_message))
        .route("/message/:conversation_id/history", get(get_history))
}

/// Combined router with all message routes under /api.
pub fn message_router() -> Router<MessageAppState> {
    Router::new().nest("/api", message_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_router_creates_combined_router() {
        let _router = message_router();
    }
}
