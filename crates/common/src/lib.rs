//! Shared types, the reply queue, and the service traits that connect the
//! WhatsApp session, the Telegram relay, and the bridge loop.

pub mod queue;
pub mod traits;
pub mod types;

pub use {
    queue::ReplyQueue,
    traits::{ChatSession, Relay},
    types::{InboundMessage, OutboundReply},
};
