//! Conversation domain module.
//!
//! Turns, per-connection sessions, history pairing and reply chunking.

mod chunking;
mod history;
mod session;
mod turn;

pub use chunking::chunk_reply;
pub use history::{pair_turns, TurnPair};
pub use session::{ConversationMeta, Session};
pub use turn::{NewTurn, Role, Turn, TurnMetadata, TurnType};
