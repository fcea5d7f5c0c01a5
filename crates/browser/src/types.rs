//! Locators, element references, and launch options.

use std::{fmt, path::PathBuf};

use wa2tg_config::WhatsAppConfig;

/// A named XPath query.
///
/// The name only shows up in logs and errors; the XPath is evaluated either
/// against the document or relative to another element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub name: &'static str,
    pub xpath: &'static str,
}

impl Locator {
    pub const fn new(name: &'static str, xpath: &'static str) -> Self {
        Self { name, xpath }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Handle to a DOM element stamped by the driver.
///
/// Refs are never reused within one driver instance. Once the element leaves
/// the DOM the ref is stale and every operation on it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementRef(pub u32);

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ref {}", self.0)
    }
}

/// Special keys that can be injected into a focused element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
}

impl Key {
    /// DOM `key` value.
    pub fn key(self) -> &'static str {
        match self {
            Self::Enter => "Enter",
        }
    }

    /// DOM `code` value.
    pub fn code(self) -> &'static str {
        match self {
            Self::Enter => "Enter",
        }
    }

    /// Windows virtual key code, which Chrome uses to synthesize the event.
    pub fn virtual_key_code(self) -> i64 {
        match self {
            Self::Enter => 13,
        }
    }

    /// Text produced by the key press.
    pub fn text(self) -> &'static str {
        match self {
            Self::Enter => "\r",
        }
    }
}

/// How to launch the browser.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    /// Persistent profile directory (cookies, local storage).
    pub user_data_dir: PathBuf,
    /// UI language (`--lang`).
    pub locale: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Custom Chrome/Chromium path (auto-detected if None).
    pub chrome_path: Option<String>,
    /// Additional Chrome arguments.
    pub chrome_args: Vec<String>,
    /// CDP request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::from(&WhatsAppConfig::default())
    }
}

impl From<&WhatsAppConfig> for LaunchOptions {
    fn from(config: &WhatsAppConfig) -> Self {
        Self {
            headless: config.headless,
            user_data_dir: config.user_data_dir.clone(),
            locale: config.locale.clone(),
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            chrome_path: config.chrome_path.clone(),
            chrome_args: config.chrome_args.clone(),
            request_timeout_ms: config.request_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_options_follow_whatsapp_config() {
        let config = WhatsAppConfig {
            headless: false,
            locale: "ru".into(),
            chrome_args: vec!["--mute-audio".into()],
            ..Default::default()
        };
        let options = LaunchOptions::from(&config);
        assert!(!options.headless);
        assert_eq!(options.locale, "ru");
        assert_eq!(options.viewport_width, 1920);
        assert_eq!(options.viewport_height, 1080);
        assert_eq!(options.chrome_args, vec!["--mute-audio".to_string()]);
        assert_eq!(options.user_data_dir, PathBuf::from("whatsapp_user_data"));
    }

    #[test]
    fn locator_displays_its_name() {
        let locator = Locator::new("search box", "//div");
        assert_eq!(locator.to_string(), "search box");
        assert_eq!(ElementRef(7).to_string(), "ref 7");
    }

    #[test]
    fn enter_key_synthesizes_carriage_return() {
        assert_eq!(Key::Enter.key(), "Enter");
        assert_eq!(Key::Enter.virtual_key_code(), 13);
        assert_eq!(Key::Enter.text(), "\r");
    }
}
