//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, and error types that form the
//! vocabulary of the conversation domain.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedSubject};
pub use errors::{ErrorCode, ValidationError};
pub use ids::{ConnectionId, ConversationId, MessageId, SubjectId, TurnId};
pub use timestamp::Timestamp;
