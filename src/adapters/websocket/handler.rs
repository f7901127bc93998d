//! WebSocket upgrade handler for conversation streaming.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Reject malformed conversation ids before upgrading
//! 2. Upgrade, then verify the bearer token and the conversation
//! 3. Register the session and process frames one at a time
//! 4. Remove the session exactly once, however the connection ends

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{Sink, SinkExt, StreamExt};
use serde::Deserialize;
use thiserror::Error;

use crate::application::handlers::StreamTurnHandler;
use crate::domain::conversation::Session;
use crate::domain::foundation::{AuthError, ConnectionId, ConversationId, ErrorCode};
use crate::ports::{
    ConversationStore, SinkError, StoreError, StreamEvent, StreamEventSink, TokenVerifier,
};

use super::dispatcher::{DispatchError, StreamingDispatcher};
use super::messages::{ProtocolError, ServerEnvelope};
use super::registry::SessionRegistry;

// ════════════════════════════════════════════════════════════════════════════════
// WebSocket State
// ════════════════════════════════════════════════════════════════════════════════

/// State required for conversation WebSocket handling.
#[derive(Clone)]
pub struct StreamingState {
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub conversation_store: Arc<dyn ConversationStore>,
    pub registry: Arc<SessionRegistry>,
    pub dispatcher: Arc<StreamingDispatcher>,
}

impl StreamingState {
    pub fn new(
        token_verifier: Arc<dyn TokenVerifier>,
        conversation_store: Arc<dyn ConversationStore>,
        registry: Arc<SessionRegistry>,
        stream_handler: Arc<StreamTurnHandler>,
    ) -> Self {
        let dispatcher = Arc::new(StreamingDispatcher::new(registry.clone(), stream_handler));
        Self {
            token_verifier,
            conversation_store,
            registry,
            dispatcher,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Parameters
// ════════════════════════════════════════════════════════════════════════════════

/// Query parameters for WebSocket connection.
#[derive(Debug, Default, Deserialize)]
pub struct WsConnectParams {
    /// Bearer token, optionally prefixed with `Bearer `.
    pub token: Option<String>,
}

/// Strips an optional `Bearer ` prefix, in plain or still-encoded form.
///
/// Returns `None` when nothing usable is left.
pub fn extract_bearer(raw: Option<&str>) -> Option<&str> {
    let raw = raw?.trim();
    let token = ["Bearer ", "bearer ", "Bearer%20", "bearer%20", "Bearer+"]
        .iter()
        .find_map(|prefix| raw.strip_prefix(prefix))
        .unwrap_or(raw)
        .trim();

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Connection Lifecycle
// ════════════════════════════════════════════════════════════════════════════════

/// Where a connection is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Active,
    Closed,
}

/// Handshake failures. All of them end the connection.
#[derive(Debug, Clone, Error)]
pub enum HandshakeError {
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("Conversation lookup failed: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Handshake attempted in state {0:?}")]
    InvalidState(ConnectionState),
}

impl HandshakeError {
    /// Close code sent after the error envelope.
    pub fn close_code(&self) -> u16 {
        match self {
            HandshakeError::Unauthorized(_) => close_code::UNSUPPORTED,
            HandshakeError::ConversationNotFound(_) => close_code::INVALID,
            HandshakeError::StoreUnavailable(_) | HandshakeError::InvalidState(_) => {
                close_code::ERROR
            }
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            HandshakeError::Unauthorized(_) => ErrorCode::Unauthorized,
            HandshakeError::ConversationNotFound(_) => ErrorCode::ConversationNotFound,
            HandshakeError::StoreUnavailable(_) => ErrorCode::DatabaseError,
            HandshakeError::InvalidState(_) => ErrorCode::InternalError,
        }
    }

    /// Text of the `error` envelope sent before closing.
    pub fn client_message(&self) -> &'static str {
        match self {
            HandshakeError::Unauthorized(_) => "unauthorized",
            HandshakeError::ConversationNotFound(_) => "conversation not found",
            HandshakeError::StoreUnavailable(_) | HandshakeError::InvalidState(_) => {
                "internal error"
            }
        }
    }
}

/// Per-connection state machine: `Connecting → Active → Closed`.
///
/// The session is registered only once the handshake has fully succeeded,
/// and is removed exactly once, on [`close`](Self::close) or on drop,
/// whichever comes first.
#[derive(Debug)]
pub struct ConnectionLifecycle {
    connection_id: ConnectionId,
    conversation_id: ConversationId,
    state: ConnectionState,
    registry: Arc<SessionRegistry>,
}

impl ConnectionLifecycle {
    pub fn new(registry: Arc<SessionRegistry>, conversation_id: ConversationId) -> Self {
        Self {
            connection_id: ConnectionId::new(),
            conversation_id,
            state: ConnectionState::Connecting,
            registry,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Verifies the credential and the conversation, then registers the session.
    ///
    /// On failure the lifecycle is `Closed` and nothing was registered.
    pub async fn handshake(
        &mut self,
        raw_token: Option<&str>,
        verifier: &dyn TokenVerifier,
        conversations: &dyn ConversationStore,
    ) -> Result<Session, HandshakeError> {
        if self.state != ConnectionState::Connecting {
            return Err(HandshakeError::InvalidState(self.state));
        }

        match self.verify(raw_token, verifier, conversations).await {
            Ok(session) => {
                self.registry.put(session.clone());
                self.state = ConnectionState::Active;
                Ok(session)
            }
            Err(e) => {
                self.state = ConnectionState::Closed;
                Err(e)
            }
        }
    }

    async fn verify(
        &self,
        raw_token: Option<&str>,
        verifier: &dyn TokenVerifier,
        conversations: &dyn ConversationStore,
    ) -> Result<Session, HandshakeError> {
        let token = extract_bearer(raw_token).ok_or(AuthError::MissingToken)?;
        let subject_id = verifier.verify(token).await?;

        if !conversations.exists(self.conversation_id).await? {
            return Err(HandshakeError::ConversationNotFound(self.conversation_id));
        }

        Ok(Session::new(
            self.connection_id,
            self.conversation_id,
            subject_id,
        ))
    }

    /// Moves to `Closed`, removing the session if one was registered.
    ///
    /// Returns true only on the call that actually removed it.
    pub fn close(&mut self) -> bool {
        let was_active = self.state == ConnectionState::Active;
        self.state = ConnectionState::Closed;
        was_active && self.registry.remove(&self.connection_id).is_some()
    }
}

impl Drop for ConnectionLifecycle {
    fn drop(&mut self) {
        self.close();
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Outbound Sink
// ════════════════════════════════════════════════════════════════════════════════

/// Writes stream events to a WebSocket as JSON text frames.
pub struct WebSocketSink<S> {
    sender: S,
}

impl<S> WebSocketSink<S>
where
    S: Sink<Message> + Unpin + Send,
    S::Error: std::fmt::Display,
{
    pub fn new(sender: S) -> Self {
        Self { sender }
    }

    pub async fn send_envelope(&mut self, envelope: &ServerEnvelope) -> Result<(), SinkError> {
        let json = envelope
            .encode()
            .map_err(|e: ProtocolError| SinkError(e.to_string()))?;
        self.send_frame(Message::Text(json)).await
    }

    pub async fn send_frame(&mut self, frame: Message) -> Result<(), SinkError> {
        self.sender
            .send(frame)
            .await
            .map_err(|e| SinkError(e.to_string()))
    }

    /// Sends a close frame. Errors are ignored; the peer may already be gone.
    pub async fn close(&mut self, code: u16, reason: &'static str) {
        let frame = Message::Close(Some(CloseFrame {
            code,
            reason: Cow::Borrowed(reason),
        }));
        let _ = self.sender.send(frame).await;
    }
}

#[async_trait]
impl<S> StreamEventSink for WebSocketSink<S>
where
    S: Sink<Message> + Unpin + Send,
    S::Error: std::fmt::Display,
{
    async fn emit(&mut self, event: StreamEvent) -> Result<(), SinkError> {
        self.send_envelope(&ServerEnvelope::from(event)).await
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// WebSocket Upgrade Handler
// ════════════════════════════════════════════════════════════════════════════════

/// Handle WebSocket upgrade for conversation streaming.
///
/// Route: `GET /v1/ws/conversations/:conversation_id?token=<bearer>`
///
/// A conversation id that is not an integer is rejected with 400 before the
/// upgrade. Credential and conversation checks run after the upgrade so the
/// client receives an `error` envelope before the close frame.
pub async fn conversation_ws_handler(
    ws: WebSocketUpgrade,
    Path(conversation_id): Path<String>,
    Query(params): Query<WsConnectParams>,
    State(state): State<StreamingState>,
) -> Response {
    let conversation_id: ConversationId = match conversation_id.parse() {
        Ok(id) => id,
        Err(_) => {
            tracing::debug!(raw = %conversation_id, "Rejected malformed conversation id");
            return (StatusCode::BAD_REQUEST, "Invalid conversation ID").into_response();
        }
    };

    ws.on_upgrade(move |socket| {
        handle_conversation_socket(socket, conversation_id, params.token, state)
    })
}

/// Handle an established WebSocket connection for conversation streaming.
async fn handle_conversation_socket(
    socket: WebSocket,
    conversation_id: ConversationId,
    token: Option<String>,
    state: StreamingState,
) {
    let (sender, mut receiver) = socket.split();
    let mut sink = WebSocketSink::new(sender);
    let mut lifecycle = ConnectionLifecycle::new(state.registry.clone(), conversation_id);
    let connection_id = lifecycle.connection_id();

    let session = match lifecycle
        .handshake(
            token.as_deref(),
            state.token_verifier.as_ref(),
            state.conversation_store.as_ref(),
        )
        .await
    {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(
                connection_id = %connection_id,
                conversation_id = %conversation_id,
                code = %e.code(),
                error = %e,
                "Handshake rejected"
            );
            let _ = sink
                .send_envelope(&ServerEnvelope::error(None, e.client_message()))
                .await;
            sink.close(e.close_code(), e.client_message()).await;
            return;
        }
    };

    tracing::info!(
        connection_id = %connection_id,
        conversation_id = %conversation_id,
        subject_id = %session.subject_id(),
        "WebSocket connection established"
    );

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                match state.dispatcher.dispatch(connection_id, &text, &mut sink).await {
                    Ok(_) => {}
                    Err(DispatchError::SessionNotInitialized(_)) => {
                        tracing::error!(
                            connection_id = %connection_id,
                            "Frame received without a registered session"
                        );
                        let _ = sink
                            .send_envelope(&ServerEnvelope::error(None, "session not initialized"))
                            .await;
                        sink.close(close_code::ERROR, "session not initialized").await;
                        break;
                    }
                    Err(DispatchError::Transport(e)) => {
                        tracing::debug!(connection_id = %connection_id, "Send failed: {}", e);
                        break;
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                if state
                    .dispatcher
                    .reject_malformed(connection_id, &ProtocolError::BinaryFrame, &mut sink)
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Ping(data)) => {
                if sink.send_frame(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "Client closed connection");
                break;
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    lifecycle.close();

    tracing::info!(
        connection_id = %connection_id,
        conversation_id = %conversation_id,
        subject_id = %session.subject_id(),
        "WebSocket connection closed"
    );
}

/// Create axum router for the streaming endpoint.
pub fn websocket_router() -> axum::Router<StreamingState> {
    use axum::routing::get;

    axum::Router::new().route(
        "/v1/ws/conversations/:conversation_id",
        get(conversation_ws_handler),
    )
}
