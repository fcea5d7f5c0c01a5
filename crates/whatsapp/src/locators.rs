//! XPath locators for the WhatsApp Web UI.
//!
//! These track WhatsApp's markup and break when it changes; keep every
//! structural selector here.

use wa2tg_browser::Locator;

/// Only present once the chat list of a linked device is shown.
pub const AUTHENTICATED: Locator =
    Locator::new("chat list marker", r#"//span[@data-icon="chats-filled"]"#);

pub const QR_CODE: Locator = Locator::new(
    "login QR code",
    "//canvas[@aria-label='Scan this QR code to link a device!']",
);

/// Unread badges in the chat list, one locator per UI language. Results are
/// concatenated in this order.
pub const UNREAD_INDICATORS: [Locator; 3] = [
    Locator::new(
        "unread badge (en)",
        "//span[contains(@aria-label, 'unread message')]",
    ),
    Locator::new(
        "unread badge (ru)",
        "//span[contains(@aria-label, 'непрочитанное сообщение')]",
    ),
    Locator::new(
        "unread badge (ru, plural)",
        "//span[contains(@aria-label, 'непрочитанных')]",
    ),
];

/// Title of the open conversation.
pub const CHAT_HEADER: Locator = Locator::new("chat header", "//header/div[2]/div/div/div/span");

pub const MESSAGE_BUBBLES: Locator = Locator::new(
    "message bubbles",
    "//div[contains(@class, 'copyable-text')]/parent::*",
);

/// Text fragments inside one bubble, relative to it.
pub const BUBBLE_TEXT: Locator = Locator::new(
    "bubble text",
    ".//span[contains(@class, 'selectable-text') and contains(@class, 'copyable-text')]/span",
);

pub const SEARCH_BOX: Locator = Locator::new(
    "chat search box",
    "//div[@contenteditable='true' and @aria-autocomplete='list']",
);

pub const COMPOSE_BOX: Locator = Locator::new(
    "compose box",
    "//div[@contenteditable='true' and @data-tab='10']",
);
