//! Telegram side of the bridge.
//!
//! [`TelegramRelay`] forwards WhatsApp messages into one Telegram chat via
//! the Bot API and turns the operator's replies to those forwards into
//! [`OutboundReply`](wa2tg_common::OutboundReply) items for the bridge loop.

pub mod bot;
pub mod error;
pub mod handlers;
pub mod outbound;
pub mod relay;

#[cfg(test)]
pub(crate) mod mock_api;

pub use {
    error::{Error, Result},
    relay::TelegramRelay,
};
