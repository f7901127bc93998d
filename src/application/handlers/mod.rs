//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod conversation;

pub use conversation::{
    // Streaming
    StreamTurnCommand,
    StreamTurnConfig,
    StreamTurnError,
    StreamTurnHandler,
    StreamTurnResult,
    // Request/response
    SendMessageCommand,
    SendMessageError,
    SendMessageHandler,
    SendMessageResult,
    // History
    GetHistoryError,
    GetHistoryHandler,
    GetHistoryQuery,
    HistoryPage,
};
