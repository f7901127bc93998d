//! WebSocket message types for conversation streaming.
//!
//! Defines the protocol between server and connected clients:
//! - Client → Server: `message` envelopes carrying user text
//! - Server → Client: `message_start`, `message_delta`, `message_end`, `error`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::StreamEvent;

/// The only client envelope type the server acts on.
pub const MESSAGE_TYPE: &str = "message";

// ============================================
// Client → Server Messages
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClientEnvelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    content: Option<String>,
    message_id: Option<String>,
}

/// A decoded client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEnvelope {
    /// A user message to answer.
    Message {
        content: String,
        message_id: Option<String>,
    },

    /// Well-formed, but of a type the server does not handle.
    Unsupported {
        kind: String,
        message_id: Option<String>,
    },
}

impl ClientEnvelope {
    /// The client-supplied id, if any.
    pub fn message_id(&self) -> Option<&str> {
        match self {
            ClientEnvelope::Message { message_id, .. }
            | ClientEnvelope::Unsupported { message_id, .. } => message_id.as_deref(),
        }
    }
}

/// Why a frame could not be decoded or encoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("binary frames are not supported")]
    BinaryFrame,

    #[error("failed to encode envelope: {0}")]
    Encode(String),
}

/// Decodes one text frame.
///
/// Unknown fields are ignored. A `message` envelope without `content` is
/// malformed; any other `type` decodes to [`ClientEnvelope::Unsupported`].
pub fn decode_client_envelope(text: &str) -> Result<ClientEnvelope, ProtocolError> {
    let raw: RawClientEnvelope =
        serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

    let kind = raw.kind.ok_or(ProtocolError::MissingField("type"))?;
    if kind != MESSAGE_TYPE {
        return Ok(ClientEnvelope::Unsupported {
            kind,
            message_id: raw.message_id,
        });
    }

    let content = raw.content.ok_or(ProtocolError::MissingField("content"))?;
    Ok(ClientEnvelope::Message {
        content,
        message_id: raw.message_id,
    })
}

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEnvelope {
    #[serde(rename_all = "camelCase")]
    MessageStart { message_id: String },

    #[serde(rename_all = "camelCase")]
    MessageDelta { message_id: String, content: String },

    #[serde(rename_all = "camelCase")]
    MessageEnd { message_id: String },

    /// `messageId` is always present on the wire, `null` when unknown.
    #[serde(rename_all = "camelCase")]
    Error {
        message_id: Option<String>,
        error: String,
    },
}

impl ServerEnvelope {
    pub fn error(message_id: Option<String>, error: impl Into<String>) -> Self {
        ServerEnvelope::Error {
            message_id,
            error: error.into(),
        }
    }

    /// Serializes to the JSON text of one frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

impl From<StreamEvent> for ServerEnvelope {
    fn from(event: StreamEvent) -> Self {
        match event {
            StreamEvent::Start { message_id } => ServerEnvelope::MessageStart {
                message_id: message_id.to_string(),
            },
            StreamEvent::Delta {
                message_id,
                content,
            } => ServerEnvelope::MessageDelta {
                message_id: message_id.to_string(),
                content,
            },
            StreamEvent::End { message_id } => ServerEnvelope::MessageEnd {
                message_id: message_id.to_string(),
            },
            StreamEvent::Error { message_id, error } => ServerEnvelope::Error { message_id, error },
        }
    }
}
