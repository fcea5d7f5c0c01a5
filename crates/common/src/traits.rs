//! Service traits at the seams between the WhatsApp session, the Telegram
//! relay, and the bridge loop.

use {anyhow::Result, async_trait::async_trait};

use crate::types::{InboundMessage, OutboundReply};

/// The chat-bot side of the bridge: delivers scraped messages to the operator
/// and collects their replies.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Connect and begin listening for replies.
    async fn start(&self) -> Result<()>;

    /// Stop listening. Safe to call when not started.
    async fn stop(&self);

    /// Send a message labelled with the WhatsApp chat it came from.
    async fn send_text(&self, chat: &str, text: &str) -> Result<()>;

    /// Send an image (the login QR code screenshot) with a caption.
    async fn send_image(&self, png: Vec<u8>, caption: &str) -> Result<()>;

    /// Drain every reply queued since the previous call, oldest first.
    fn take_all_pending(&self) -> Vec<OutboundReply>;
}

/// The WhatsApp side of the bridge.
///
/// Methods take `&mut self`: the session is driven by exactly one task and
/// needs no lock.
#[async_trait]
pub trait ChatSession: Send {
    async fn start(&mut self) -> Result<()>;

    /// Release the browser. Idempotent.
    async fn stop(&mut self);

    /// Scrape messages from unread chats.
    ///
    /// Recoverable driver failures are handled internally; an error here means
    /// the session could not be brought back.
    async fn get_new_messages(&mut self) -> Result<Vec<InboundMessage>>;

    /// Deliver `text` to the chat named `chat`. Delivery is best effort.
    async fn send_message(&mut self, chat: &str, text: &str) -> Result<()>;
}
