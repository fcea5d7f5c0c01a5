//! WhatsApp Web session for the bridge.
//!
//! [`WhatsAppClient`] owns one browser session, logs it in by forwarding the
//! QR code through the [`Relay`](wa2tg_common::Relay), scrapes unread chats,
//! and types replies back into WhatsApp. Driver failures during scraping or
//! sending restart the session instead of surfacing to the caller.

pub mod dispatch;
pub mod error;
pub mod extract;
pub mod locators;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    error::{Result, SessionError},
    extract::{SKIP_AGGREGATE_INDICATOR, parse_unread_count},
    session::{QR_CAPTION, SessionState, WhatsAppClient},
};
