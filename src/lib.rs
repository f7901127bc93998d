//! Conversation Gateway - conversational agent backend
//!
//! Clients exchange messages with an assistant either over plain HTTP or over
//! a per-conversation WebSocket on which each reply is streamed in chunks.
//! Every exchange is persisted as a user turn followed by an assistant turn.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod server;
