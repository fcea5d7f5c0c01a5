//! Config schema types.

use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration (`wa2tg.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Wa2tgConfig {
    pub telegram: TelegramConfig,
    pub whatsapp: WhatsAppConfig,
    pub bridge: BridgeConfig,
}

/// Telegram bot credentials and the single chat the bridge talks to.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Numeric id of the operator chat. Kept as text so env values and file
    /// values go through the same parser.
    pub chat_id: String,

    /// Long-polling timeout passed to `getUpdates` (seconds).
    pub poll_timeout_secs: u32,
}

impl TelegramConfig {
    /// Whether a non-blank token is configured.
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }

    /// Parse the configured chat id.
    pub fn chat_id(&self) -> Option<i64> {
        self.chat_id.trim().parse().ok()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            chat_id: String::new(),
            poll_timeout_secs: 30,
        }
    }
}

/// Browser session settings for WhatsApp Web.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    /// WhatsApp Web entry point.
    pub url: String,
    /// Chrome profile directory. Reused across restarts so the QR login
    /// survives.
    pub user_data_dir: PathBuf,
    pub headless: bool,
    /// UI language requested from Chrome (`--lang`).
    pub locale: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Custom Chrome/Chromium executable (auto-detected when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<String>,
    /// Extra Chrome command-line arguments.
    pub chrome_args: Vec<String>,
    /// CDP request timeout (ms).
    pub request_timeout_ms: u64,
    /// How long to wait for the chat list marker before deciding the session
    /// is logged out.
    pub auth_timeout_secs: u64,
    /// How long to wait for the QR code to render.
    pub qr_timeout_secs: u64,
    /// How long the operator has to scan the QR code.
    pub qr_scan_timeout_secs: u64,
    /// How long to wait for the chat search box.
    pub search_timeout_secs: u64,
    /// Pause after opening a chat or focusing the search box (ms).
    pub settle_delay_ms: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            url: "https://web.whatsapp.com".into(),
            user_data_dir: PathBuf::from("whatsapp_user_data"),
            headless: true,
            locale: "en".into(),
            viewport_width: 1920,
            viewport_height: 1080,
            chrome_path: None,
            chrome_args: Vec::new(),
            request_timeout_ms: 30_000,
            auth_timeout_secs: 30,
            qr_timeout_secs: 30,
            qr_scan_timeout_secs: 60,
            search_timeout_secs: 30,
            settle_delay_ms: 1_000,
        }
    }
}

/// Relay loop pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Pause between poll cycles (seconds).
    pub poll_interval_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_whatsapp_web_session() {
        let cfg = Wa2tgConfig::default();
        assert_eq!(cfg.whatsapp.url, "https://web.whatsapp.com");
        assert!(cfg.whatsapp.headless);
        assert_eq!(cfg.whatsapp.locale, "en");
        assert_eq!(
            (cfg.whatsapp.viewport_width, cfg.whatsapp.viewport_height),
            (1920, 1080)
        );
        assert_eq!(cfg.whatsapp.auth_timeout_secs, 30);
        assert_eq!(cfg.whatsapp.qr_scan_timeout_secs, 60);
        assert_eq!(cfg.bridge.poll_interval_secs, 2);
        assert!(!cfg.telegram.has_token());
        assert_eq!(cfg.telegram.chat_id(), None);
    }

    #[test]
    fn deserialize_partial_toml_keeps_defaults() {
        let raw = r#"
            [telegram]
            token = "123:ABC"
            chat_id = "-10042"

            [whatsapp]
            headless = false
        "#;
        let cfg: Wa2tgConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.telegram.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.telegram.chat_id(), Some(-100_42));
        assert!(!cfg.whatsapp.headless);
        assert_eq!(cfg.whatsapp.settle_delay_ms, 1_000);
        assert_eq!(cfg.telegram.poll_timeout_secs, 30);
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = TelegramConfig {
            token: Secret::new("super-secret".into()),
            ..Default::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn chat_id_rejects_non_numeric() {
        let cfg = TelegramConfig {
            chat_id: "my-chat".into(),
            ..Default::default()
        };
        assert_eq!(cfg.chat_id(), None);
    }
}
