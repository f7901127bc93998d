//! Outbound stream port.
//!
//! The application layer emits [`StreamEvent`]s; the transport adapter decides
//! how they look on the wire.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::MessageId;

/// One outbound event of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Start { message_id: MessageId },
    Delta { message_id: MessageId, content: String },
    End { message_id: MessageId },
    /// `message_id` is whatever id best identifies the failed attempt: the
    /// generated reply id once known, otherwise the client's own id, if any.
    Error {
        message_id: Option<String>,
        error: String,
    },
}

/// The transport is gone; nothing more can be sent on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Stream closed: {0}")]
pub struct SinkError(pub String);

/// Destination for stream events of a single connection.
///
/// Delivery order must equal emission order.
#[async_trait]
pub trait StreamEventSink: Send {
    async fn emit(&mut self, event: StreamEvent) -> Result<(), SinkError>;
}

#[async_trait]
impl StreamEventSink for Vec<StreamEvent> {
    async fn emit(&mut self, event: StreamEvent) -> Result<(), SinkError> {
        self.push(event);
        Ok(())
    }
}
