//! WebSocket adapter for streaming assistant replies.
//!
//! Clients connect to `/v1/ws/conversations/:conversation_id`, authenticate with
//! a bearer token, and receive each reply as `message_start`, one or more
//! `message_delta`, and `message_end`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ conversation_ws_handler                                       │
//! │   ConnectionLifecycle: Connecting → Active → Closed           │
//! └──────────────────────────────────────────────────────────────┘
//!                  │ one text frame at a time
//!                  ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │ StreamingDispatcher                                           │
//! │   decode → SessionRegistry lookup → StreamTurnHandler         │
//! └──────────────────────────────────────────────────────────────┘
//!                  │ StreamEvent
//!                  ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │ WebSocketSink: ServerEnvelope as JSON text frames             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod dispatcher;
pub mod handler;
pub mod messages;
pub mod registry;

pub use dispatcher::{DispatchError, DispatchOutcome, StreamingDispatcher};
pub use handler::{
    conversation_ws_handler, extract_bearer, websocket_router, ConnectionLifecycle,
    ConnectionState, HandshakeError, StreamingState, WebSocketSink, WsConnectParams,
};
pub use messages::{
    decode_client_envelope, ClientEnvelope, ProtocolError, ServerEnvelope, MESSAGE_TYPE,
};
pub use registry::SessionRegistry;
