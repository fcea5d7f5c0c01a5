//! Typing replies into WhatsApp chats.

use std::time::Duration;

use {
    tracing::{info, warn},
    wa2tg_browser::{Key, PageDriver, Result, wait_for},
};

use crate::locators;

/// Whether a reply reached a compose box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The search box or the chat's compose box was not found.
    Dropped,
}

/// Search for `chat`, open the top result and send `text` there.
///
/// The first search hit is assumed to be the right chat. The page is
/// refreshed afterwards so the next scrape starts from the chat list.
pub(crate) async fn send_reply(
    driver: &dyn PageDriver,
    chat: &str,
    text: &str,
    search_timeout: Duration,
    settle: Duration,
) -> Result<Delivery> {
    let Some(search) = wait_for(driver, &locators::SEARCH_BOX, search_timeout).await? else {
        warn!(chat, "search box not found, dropping reply");
        return Ok(Delivery::Dropped);
    };

    driver.click(search).await?;
    tokio::time::sleep(settle).await;
    driver.type_text(search, chat).await?;
    driver.press_key(search, Key::Enter).await?;

    let Some(compose) = wait_for(driver, &locators::COMPOSE_BOX, settle).await? else {
        warn!(chat, "compose box not found, dropping reply");
        driver.refresh().await?;
        return Ok(Delivery::Dropped);
    };

    driver.clear(compose).await?;
    driver.type_text(compose, text).await?;
    driver.press_key(compose, Key::Enter).await?;
    driver.refresh().await?;

    info!(chat, chars = text.chars().count(), "sent reply to WhatsApp");
    Ok(Delivery::Sent)
}
