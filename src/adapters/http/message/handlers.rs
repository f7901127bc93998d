//! HTTP handlers for message endpoints.
//!
//! These handlers connect Axum routes to application layer operations.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::{
    GetHistoryError, GetHistoryHandler, GetHistoryQuery, SendMessageCommand, SendMessageError,
    SendMessageHandler,
};
use crate::domain::conversation::TurnType;
use crate::domain::foundation::{ConversationId, Timestamp};

use super::dto::{
    ErrorResponse, HistoryParams, HistoryResponse, SendMessageRequest, SendMessageResponse,
    TurnView,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state for message handlers.
#[derive(Clone)]
pub struct MessageAppState {
    pub send_message: Arc<SendMessageHandler>,
    pub get_history: Arc<GetHistoryHandler>,
}

impl MessageAppState {
    pub fn new(send_message: Arc<SendMessageHandler>, get_history: Arc<GetHistoryHandler>) -> Self {
        Self {
            send_message,
            get_history,
        }
    }
}

fn parse_conversation_id(raw: &str) -> Result<ConversationId, MessageApiError> {
    raw.parse()
        .map_err(|_| MessageApiError::BadRequest("Invalid conversation ID format".to_string()))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/message/:conversation_id/send_message
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/message/:conversation_id/send_message - Exchange one message.
///
/// # Errors
/// - 400 Bad Request: Empty or oversized content, bad id or type
/// - 401 Unauthorized: No valid auth token
/// - 404 Not Found: Conversation does not exist
/// - 500 Internal Server Error: Store or reply failure
pub async fn send_message(
    State(state): State<MessageAppState>,
    RequireAuth(subject): RequireAuth,
    Path(conversation_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, MessageApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let mut cmd = SendMessageCommand::new(conversation_id, subject.id, body.content);
    if let Some(turn_type) = body.turn_type {
        let turn_type =
            TurnType::new(turn_type).map_err(|e| MessageApiError::BadRequest(e.to_string()))?;
        cmd = cmd.with_type(turn_type);
    }
    if let Some(metadata) = body.metadata {
        cmd = cmd.with_metadata(metadata);
    }

    let result = state.send_message.handle(cmd).await?;

    let response = SendMessageResponse {
        user_message: TurnView::from(&result.user_turn),
        agent_message: TurnView::from(&result.assistant_turn),
    };
    Ok((StatusCode::OK, Json(response)))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /api/message/:conversation_id/history
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/message/:conversation_id/history - Paged, paired history.
///
/// # Query Parameters
/// - `page`: 1-based page (default: 1)
/// - `limit`: Turns per page (default: 20, max: 100)
/// - `before`: RFC 3339 cursor
///
/// # Errors
/// - 400 Bad Request: Bad id or cursor
/// - 401 Unauthorized: No valid auth token
/// - 404 Not Found: Conversation does not exist
pub async fn get_history(
    State(state): State<MessageAppState>,
    RequireAuth(_subject): RequireAuth,
    Path(conversation_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, MessageApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let before = params
        .before
        .as_deref()
        .map(str::parse::<Timestamp>)
        .transpose()
        .map_err(|e| MessageApiError::BadRequest(e.to_string()))?;

    let page = state
        .get_history
        .handle(GetHistoryQuery::new(
            conversation_id,
            params.page,
            params.limit,
            before,
        ))
        .await?;

    Ok((StatusCode::OK, Json(HistoryResponse::from(&page))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type for message endpoints.
#[derive(Debug, Clone)]
pub enum MessageApiError {
    BadRequest(String),
    NotFound(String, String),
    Internal(String),
}

impl IntoResponse for MessageApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            MessageApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg))
            }
            MessageApiError::NotFound(resource, id) => {
                (StatusCode::NOT_FOUND, ErrorResponse::not_found(&resource, &id))
            }
            MessageApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal("An internal error occurred"),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<SendMessageError> for MessageApiError {
    fn from(err: SendMessageError) -> Self {
        match err {
            SendMessageError::EmptyContent | SendMessageError::ContentTooLong { .. } => {
                MessageApiError::BadRequest(err.to_string())
            }
            SendMessageError::ConversationNotFound(id) => {
                MessageApiError::NotFound("Conversation".to_string(), id.to_string())
            }
            other => MessageApiError::Internal(other.to_string()),
        }
    }
}

impl From<GetHistoryError> for MessageApiError {
    fn from(err: GetHistoryError) -> Self {
        match err {
            GetHistoryError::ConversationNotFound(id) => {
                MessageApiError::NotFound("Conversation".to_string(), id.to_string())
            }
            GetHistoryError::Store(e) => MessageApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StoreError;

    // ════════════════════════════════════════════════════════════════════════════
    // MessageApiError Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn bad_request_returns_400() {
        let response = MessageApiError::BadRequest("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_returns_404() {
        let err = MessageApiError::NotFound("Conversation".to_string(), "42".to_string());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_returns_500() {
        let response = MessageApiError::Internal("Something broke".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    mod error_mapping {
        use super::*;

        #[test]
        fn empty_content_is_bad_request() {
            let err: MessageApiError = SendMessageError::EmptyContent.into();
            assert!(matches!(err, MessageApiError::BadRequest(_)));
        }

        #[test]
        fn missing_conversation_is_not_found() {
            let err: MessageApiError =
                SendMessageError::ConversationNotFound(ConversationId::new(9)).into();
            assert!(matches!(err, MessageApiError::NotFound(_, id) if id == "9"));
        }

        #[test]
        fn assistant_persistence_failure_is_internal() {
            let err: MessageApiError =
                SendMessageError::AssistantTurnNotPersisted(StoreError::unavailable("down")).into();
            assert!(matches!(err, MessageApiError::Internal(_)));
        }

        #[test]
        fn history_store_failure_is_internal() {
            let err: MessageApiError = GetHistoryError::Store(StoreError::corrupt("bad row")).into();
            assert!(matches!(err, MessageApiError::Internal(_)));
        }
    }

    #[test]
    fn conversation_id_must_be_integer() {
        assert!(parse_conversation_id("42").is_ok());
        assert!(matches!(
            parse_conversation_id("abc"),
            Err(MessageApiError::BadRequest(_))
        ));
    }
}
