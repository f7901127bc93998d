//! Reply generator adapters.

mod echo;

pub use echo::{EchoReplyGenerator, DEFAULT_REPLY_TEMPLATE};
