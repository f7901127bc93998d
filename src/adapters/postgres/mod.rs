//! PostgreSQL adapters - Database implementations for store ports.
//!
//! - `PostgresConversationStore` - conversation lookups
//! - `PostgresMessageStore` - turn persistence and paged history

mod conversation_store;
mod message_store;

pub use conversation_store::PostgresConversationStore;
pub use message_store::PostgresMessageStore;
