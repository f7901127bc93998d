//! Per-frame dispatch for streaming connections.
//!
//! Turns one inbound text frame into either a streamed reply or a single
//! `error` envelope. Only a missing session or a dead transport escape as
//! errors; everything else is reported to the client and the connection
//! carries on.

use std::sync::Arc;

use thiserror::Error;

use crate::application::handlers::{StreamTurnCommand, StreamTurnError, StreamTurnHandler};
use crate::domain::foundation::{ConnectionId, ErrorCode, MessageId};
use crate::ports::{SinkError, StreamEvent, StreamEventSink};

use super::messages::{decode_client_envelope, ClientEnvelope, ProtocolError};
use super::registry::SessionRegistry;

/// Failures that end the connection.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// A frame arrived for a connection with no registered session.
    #[error("Session not initialized for connection {0}")]
    SessionNotInitialized(ConnectionId),

    #[error(transparent)]
    Transport(#[from] SinkError),
}

/// What happened to a frame that did not end the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A full reply was streamed.
    Streamed { message_id: MessageId },
    /// One `error` envelope was sent instead.
    Rejected { code: ErrorCode },
}

/// Routes decoded frames to the streaming handler.
pub struct StreamingDispatcher {
    registry: Arc<SessionRegistry>,
    handler: Arc<StreamTurnHandler>,
}

impl StreamingDispatcher {
    pub fn new(registry: Arc<SessionRegistry>, handler: Arc<StreamTurnHandler>) -> Self {
        Self { registry, handler }
    }

    /// Handles one text frame from `connection_id`.
    ///
    /// Returns only after the whole `message_start … message_end` sequence
    /// (or the single `error` envelope) has been handed to `sink`.
    pub async fn dispatch<S>(
        &self,
        connection_id: ConnectionId,
        frame: &str,
        sink: &mut S,
    ) -> Result<DispatchOutcome, DispatchError>
    where
        S: StreamEventSink + ?Sized,
    {
        let envelope = match decode_client_envelope(frame) {
            Ok(envelope) => envelope,
            Err(e) => return self.reject_malformed(connection_id, &e, sink).await,
        };

        let session = self
            .registry
            .get(&connection_id)
            .ok_or(DispatchError::SessionNotInitialized(connection_id))?;

        let (content, client_message_id) = match envelope {
            ClientEnvelope::Message {
                content,
                message_id,
            } => (content, message_id),
            ClientEnvelope::Unsupported { kind, message_id } => {
                tracing::warn!(
                    connection_id = %connection_id,
                    kind = %kind,
                    "Unsupported message type"
                );
                sink.emit(StreamEvent::Error {
                    message_id,
                    error: format!("unsupported message type: {}", kind),
                })
                .await?;
                return Ok(DispatchOutcome::Rejected {
                    code: ErrorCode::UnsupportedMessageType,
                });
            }
        };

        let conversation_id = session.conversation_id();
        match self
            .handler
            .handle(StreamTurnCommand::new(session, content), sink)
            .await
        {
            Ok(result) => Ok(DispatchOutcome::Streamed {
                message_id: result.message_id,
            }),
            Err(StreamTurnError::Transport(e)) => Err(DispatchError::Transport(e)),
            Err(e) => {
                let message_id = e
                    .message_id()
                    .map(|id| id.to_string())
                    .or(client_message_id);

                match e.code() {
                    ErrorCode::PersistenceFailure | ErrorCode::ReplyGenerationFailed => {
                        tracing::error!(
                            connection_id = %connection_id,
                            conversation_id = %conversation_id,
                            message_id = ?message_id,
                            error = %e,
                            "Failed to stream reply"
                        );
                    }
                    _ => {
                        tracing::warn!(
                            connection_id = %connection_id,
                            conversation_id = %conversation_id,
                            error = %e,
                            "Rejected message"
                        );
                    }
                }

                sink.emit(StreamEvent::Error {
                    message_id,
                    error: client_error_text(&e),
                })
                .await?;
                Ok(DispatchOutcome::Rejected { code: e.code() })
            }
        }
    }

    /// Reports a frame that could not be decoded, including binary frames.
    pub async fn reject_malformed<S>(
        &self,
        connection_id: ConnectionId,
        error: &ProtocolError,
        sink: &mut S,
    ) -> Result<DispatchOutcome, DispatchError>
    where
        S: StreamEventSink + ?Sized,
    {
        tracing::warn!(
            connection_id = %connection_id,
            error = %error,
            "Malformed envelope"
        );
        sink.emit(StreamEvent::Error {
            message_id: None,
            error: format!("malformed envelope: {}", error),
        })
        .await?;
        Ok(DispatchOutcome::Rejected {
            code: ErrorCode::MalformedEnvelope,
        })
    }
}

/// Text shown to the client. Store and backend details stay in the logs.
fn client_error_text(error: &StreamTurnError) -> String {
    match error {
        StreamTurnError::InvalidContent(e) => e.to_string(),
        StreamTurnError::UserTurnNotPersisted(_) => "failed to save message".to_string(),
        StreamTurnError::ReplyFailed { .. } => "failed to generate reply".to_string(),
        StreamTurnError::AssistantTurnNotPersisted { .. } => "failed to save reply".to_string(),
        StreamTurnError::Transport(e) => e.to_string(),
    }
}
