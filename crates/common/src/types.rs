use serde::{Deserialize, Serialize};

/// A message scraped from an unread WhatsApp chat.
///
/// `text` may span several lines: each rendered text fragment of the message
/// bubble becomes one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Chat display name as shown in the conversation header.
    pub chat: String,
    pub text: String,
}

impl InboundMessage {
    pub fn new(chat: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat: chat.into(),
            text: text.into(),
        }
    }
}

/// A reply typed in Telegram, waiting to be delivered to a WhatsApp chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundReply {
    /// Target chat display name, matched through the WhatsApp search box.
    pub chat: String,
    pub text: String,
}

impl OutboundReply {
    pub fn new(chat: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat: chat.into(),
            text: text.into(),
        }
    }
}
