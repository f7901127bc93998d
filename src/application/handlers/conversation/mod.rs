//! Conversation command and query handlers.
//!
//! Streams replies onto live connections, exchanges messages over
//! request/response, and assembles paged history.

mod get_history;
mod send_message;
mod stream_turn;

pub use get_history::{
    GetHistoryError, GetHistoryHandler, GetHistoryQuery, HistoryPage, DEFAULT_HISTORY_LIMIT,
    MAX_HISTORY_LIMIT,
};
pub use send_message::{
    SendMessageCommand, SendMessageError, SendMessageHandler, SendMessageResult,
};
pub use stream_turn::{
    StreamTurnCommand, StreamTurnConfig, StreamTurnError, StreamTurnHandler, StreamTurnResult,
};
