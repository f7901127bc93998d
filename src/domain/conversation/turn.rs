//! Turn entity: one persisted message within a conversation.
//!
//! Turns are immutable once stored. The streaming path writes exactly two per
//! exchange, the `user` turn first and the `assistant` turn once the full reply
//! has been assembled. History pairing depends on that order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{ConversationId, Timestamp, TurnId, ValidationError};

/// Opaque key/value metadata attached to a turn.
pub type TurnMetadata = Map<String, Value>;

/// Role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Input from the connected client.
    User,
    /// Generated reply.
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// Content type of a turn. `text` unless the client says otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnType(String);

impl TurnType {
    pub const TEXT: &'static str = "text";

    /// Creates a turn type, rejecting blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("type"));
        }
        Ok(Self(value))
    }

    pub fn text() -> Self {
        Self(Self::TEXT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TurnType {
    fn default() -> Self {
        Self::text()
    }
}

impl fmt::Display for TurnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A turn that has not been stored yet.
///
/// The store assigns the id and timestamps on append.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTurn {
    pub conversation_id: ConversationId,
    pub role: Role,
    pub content: String,
    pub turn_type: TurnType,
    pub metadata: TurnMetadata,
}

impl NewTurn {
    /// A `user` turn of type `text` with empty metadata.
    pub fn user(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self {
            conversation_id,
            role: Role::User,
            content: content.into(),
            turn_type: TurnType::text(),
            metadata: TurnMetadata::new(),
        }
    }

    /// An `assistant` turn of type `text` with empty metadata.
    pub fn assistant(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self {
            conversation_id,
            role: Role::Assistant,
            content: content.into(),
            turn_type: TurnType::text(),
            metadata: TurnMetadata::new(),
        }
    }

    pub fn with_type(mut self, turn_type: TurnType) -> Self {
        self.turn_type = turn_type;
        self
    }

    pub fn with_metadata(mut self, metadata: TurnMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Materializes the stored form with the store-assigned id and clock.
    pub fn into_turn(self, id: TurnId, now: Timestamp) -> Turn {
        Turn {
            id,
            conversation_id: self.conversation_id,
            role: self.role,
            content: self.content,
            turn_type: self.turn_type,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A durable turn record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub conversation_id: ConversationId,
    pub role: Role,
    pub content: String,
    pub turn_type: TurnType,
    pub metadata: TurnMetadata,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Turn {
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert!("system".parse::<Role>().is_err());
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }

    #[test]
    fn turn_type_defaults_to_text() {
        assert_eq!(TurnType::default().as_str(), "text");
        assert!(TurnType::new(" ").is_err());
        assert_eq!(TurnType::new("image").unwrap().as_str(), "image");
    }

    #[test]
    fn new_turn_constructors_set_role_and_type() {
        let cid = ConversationId::new(3);
        let user = NewTurn::user(cid, "hi");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.turn_type, TurnType::text());
        assert!(user.metadata.is_empty());

        let assistant = NewTurn::assistant(cid, "hello");
        assert_eq!(assistant.role, Role::Assistant);
    }

    #[test]
    fn into_turn_stamps_both_timestamps() {
        let now = Timestamp::now();
        let mut meta = TurnMetadata::new();
        meta.insert("lang".into(), Value::from("en"));
        let turn = NewTurn::user(ConversationId::new(1), "hi")
            .with_metadata(meta.clone())
            .into_turn(TurnId::new(9), now);

        assert_eq!(turn.id, TurnId::new(9));
        assert_eq!(turn.created_at, now);
        assert_eq!(turn.updated_at, now);
        assert_eq!(turn.metadata, meta);
        assert!(turn.is_user());
        assert!(!turn.is_assistant());
    }
}
