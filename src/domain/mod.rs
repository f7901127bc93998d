//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, auth)
//! - `conversation` - Turns, sessions, history pairing and reply chunking

pub mod conversation;
pub mod foundation;
