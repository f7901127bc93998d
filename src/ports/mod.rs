//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Auth Ports
//!
//! - `TokenVerifier` - Bearer credential to subject
//! - `TokenIssuer` - Access token signing, refresh (possibly disabled)
//!
//! ## Persistence Ports
//!
//! - `ConversationStore` - Conversation existence and headers
//! - `MessageStore` - Append-only turn storage and paged reads
//!
//! ## Streaming Ports
//!
//! - `ReplyGenerator` - Produces the assistant reply text
//! - `StreamEventSink` - Ordered outbound events of one connection

mod conversation_store;
mod message_store;
mod reply_generator;
mod store_error;
mod stream_event_sink;
mod token_issuer;
mod token_verifier;

pub use conversation_store::ConversationStore;
pub use message_store::{MessageStore, TurnPage, TurnQuery};
pub use reply_generator::{ReplyError, ReplyGenerator};
pub use store_error::StoreError;
pub use stream_event_sink::{SinkError, StreamEvent, StreamEventSink};
pub use token_issuer::TokenIssuer;
pub use token_verifier::TokenVerifier;
