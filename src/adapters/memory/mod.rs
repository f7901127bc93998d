//! In-memory store adapters.
//!
//! Used when no database is configured, and throughout the tests.

mod conversation_store;
mod message_store;

pub use conversation_store::InMemoryConversationStore;
pub use message_store::InMemoryMessageStore;
