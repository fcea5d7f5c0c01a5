//! Reading new messages out of unread chats.

use std::time::Duration;

use {
    tracing::{debug, info, warn},
    wa2tg_browser::{ElementRef, PageDriver, Result},
    wa2tg_common::InboundMessage,
};

use crate::locators;

/// Drop the first unread badge found.
///
/// The first match is the aggregate unread counter next to the chat filter,
/// not a chat entry.
pub const SKIP_AGGREGATE_INDICATOR: bool = true;

/// Unread count from a badge's `aria-label`, e.g. `"3 unread messages"`.
///
/// Only the leading whitespace-separated token is considered and it must be
/// all ASCII digits.
pub fn parse_unread_count(label: &str) -> Option<usize> {
    let token = label.split_whitespace().next()?;
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Open every unread chat and read its newest messages.
///
/// Any driver error is returned as-is; the caller decides whether the
/// session has to be restarted.
pub(crate) async fn read_unread_chats(
    driver: &dyn PageDriver,
    settle: Duration,
) -> Result<Vec<InboundMessage>> {
    let mut badges = Vec::new();
    for locator in &locators::UNREAD_INDICATORS {
        badges.extend(driver.find_all(locator).await?);
    }
    if SKIP_AGGREGATE_INDICATOR && !badges.is_empty() {
        badges.remove(0);
    }

    if badges.is_empty() {
        debug!("no unread chats");
        return Ok(Vec::new());
    }
    info!(chats = badges.len(), "found unread chats");

    let mut messages = Vec::new();
    for &badge in &badges {
        messages.extend(read_chat(driver, badge, settle).await?);
    }

    if badges.len() > 1 {
        driver.refresh().await?;
    }

    Ok(messages)
}

async fn read_chat(
    driver: &dyn PageDriver,
    badge: ElementRef,
    settle: Duration,
) -> Result<Vec<InboundMessage>> {
    let label = driver.attribute(badge, "aria-label").await?;
    let unread = label.as_deref().and_then(parse_unread_count);

    // Opening the chat marks it read even when nothing is extracted.
    driver.click(badge).await?;
    tokio::time::sleep(settle).await;

    let Some(unread) = unread else {
        warn!(label = ?label, "unread count missing or not numeric, skipping chat");
        return Ok(Vec::new());
    };

    let Some(header) = driver.find_first(&locators::CHAT_HEADER).await? else {
        warn!("chat header not found, skipping chat");
        return Ok(Vec::new());
    };
    let chat = driver.text(header).await?;

    let bubbles = driver.find_all(&locators::MESSAGE_BUBBLES).await?;
    let newest = &bubbles[bubbles.len().saturating_sub(unread)..];

    let mut messages = Vec::with_capacity(newest.len());
    for &bubble in newest {
        let mut fragments = Vec::new();
        for span in driver.find_within(bubble, &locators::BUBBLE_TEXT).await? {
            fragments.push(driver.text(span).await?);
        }
        messages.push(InboundMessage::new(chat.clone(), fragments.join("\n")));
    }

    info!(chat = %chat, unread, extracted = messages.len(), "read chat");
    Ok(messages)
}
