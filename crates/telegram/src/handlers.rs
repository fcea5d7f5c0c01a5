use {
    teloxide::{prelude::*, types::ChatId},
    tracing::{debug, info},
    wa2tg_common::{OutboundReply, ReplyQueue},
};

use crate::outbound::TelegramOutbound;

pub const START_REPLY: &str = "WhatsApp to Telegram forwarder is active.";

/// Chat that receives replies the bridge could not route.
pub const FALLBACK_CHAT: &str = "General";

pub const NO_REPLY_OR_TEXT: &str = "Unhandled message: No reply to message or text";
pub const NO_TEXT_IN_REPLIED: &str = "Unhandled message: No text in the reply to message";
pub const NO_CHAT_NAME: &str = "Unhandled message: No chat name found in the reply to message";

/// What the polling loop needs to handle a message.
#[derive(Clone)]
pub struct HandlerContext {
    /// The only chat the bridge listens to.
    pub chat_id: ChatId,
    pub outbound: TelegramOutbound,
    pub replies: ReplyQueue,
}

/// WhatsApp chat name from the first line of a forwarded message
/// (`From: <chat>`).
pub fn chat_name_from_forward(forward: &str) -> Option<&str> {
    let first_line = forward.lines().next()?;
    let (_, name) = first_line.split_once(':')?;
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

/// Turn an operator message into a reply for the WhatsApp chat it answers.
///
/// Messages that cannot be routed become a note to the fallback chat.
pub fn route_reply(msg: &Message) -> OutboundReply {
    let (Some(text), Some(replied)) = (msg.text(), msg.reply_to_message()) else {
        return OutboundReply::new(FALLBACK_CHAT, NO_REPLY_OR_TEXT);
    };
    let Some(forward) = replied.text() else {
        return OutboundReply::new(FALLBACK_CHAT, NO_TEXT_IN_REPLIED);
    };
    match chat_name_from_forward(forward) {
        Some(chat) => OutboundReply::new(chat, text),
        None => OutboundReply::new(FALLBACK_CHAT, NO_CHAT_NAME),
    }
}

fn command(text: &str) -> Option<&str> {
    let word = text.strip_prefix('/')?.split_whitespace().next()?;
    // `/start@wa2tg_bot` in groups
    Some(word.split('@').next().unwrap_or(word))
}

/// Handle one inbound message from the polling loop.
pub async fn handle_message(msg: &Message, ctx: &HandlerContext) -> crate::Result<()> {
    if msg.chat.id != ctx.chat_id {
        debug!(chat_id = msg.chat.id.0, "ignoring message from other chat");
        return Ok(());
    }

    let Some(text) = msg.text() else {
        debug!(message_id = msg.id.0, "ignoring non-text message");
        return Ok(());
    };

    match command(text) {
        Some("start") => {
            ctx.outbound.send_text_to(msg.chat.id, START_REPLY).await?;
            info!("answered /start");
        },
        Some(other) => {
            debug!(command = other, "ignoring unknown command");
        },
        None => {
            let reply = route_reply(msg);
            info!(chat = %reply.chat, "queued reply for WhatsApp");
            ctx.replies.push(reply);
        },
    }
    Ok(())
}
