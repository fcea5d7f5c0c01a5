//! Browser session lifecycle and the [`ChatSession`] implementation.

use std::{fmt, sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    tracing::{debug, info, warn},
    wa2tg_browser::{DriverLauncher, LaunchOptions, PageDriver, wait_for, wait_until_stale},
    wa2tg_common::{ChatSession, InboundMessage, Relay},
    wa2tg_config::WhatsAppConfig,
};

use crate::{
    dispatch::{self, Delivery},
    error::{Result, SessionError},
    extract, locators,
};

/// Caption of the QR code screenshot sent through the relay.
pub const QR_CAPTION: &str = "Scan this QR code to authenticate WhatsApp";

/// Lifecycle of the browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    /// Browser is up but WhatsApp shows the login screen.
    Unauthenticated,
    Authenticated,
    /// Recovering from a driver failure.
    Restarting,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotStarted => "not started",
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::Restarting => "restarting",
            Self::Stopped => "stopped",
        })
    }
}

/// A WhatsApp Web session in a browser with a persistent profile.
///
/// At most one browser is alive at a time; [`restart`](Self::restart) closes
/// the old one before launching the next.
pub struct WhatsAppClient {
    config: WhatsAppConfig,
    launcher: Arc<dyn DriverLauncher>,
    relay: Arc<dyn Relay>,
    driver: Option<Box<dyn PageDriver>>,
    state: SessionState,
}

impl WhatsAppClient {
    pub fn new(
        config: WhatsAppConfig,
        launcher: Arc<dyn DriverLauncher>,
        relay: Arc<dyn Relay>,
    ) -> Self {
        Self {
            config,
            launcher,
            relay,
            driver: None,
            state: SessionState::NotStarted,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Launch the browser, open WhatsApp Web and log in if needed.
    ///
    /// Navigation errors are only logged: the page is then treated as
    /// logged out and the QR flow reports the real problem.
    pub async fn start(&mut self) -> Result<()> {
        if self.driver.is_some() {
            warn!("session already running, restarting browser");
            self.stop().await;
        }

        let options = LaunchOptions::from(&self.config);
        let driver = self
            .launcher
            .launch(&options)
            .await
            .map_err(SessionError::LaunchFailed)?;

        if let Err(e) = driver.navigate(&self.config.url).await {
            warn!(url = %self.config.url, error = %e, "failed to open WhatsApp Web");
        }
        self.driver = Some(driver);
        self.state = SessionState::Unauthenticated;

        if !self.is_authenticated().await {
            self.authenticate().await?;
        }
        self.state = SessionState::Authenticated;
        info!("WhatsApp session ready");
        Ok(())
    }

    /// Whether the chat list shows up within the auth timeout.
    pub async fn is_authenticated(&self) -> bool {
        let Some(driver) = self.driver.as_deref() else {
            return false;
        };
        let timeout = Duration::from_secs(self.config.auth_timeout_secs);
        match wait_for(driver, &locators::AUTHENTICATED, timeout).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                debug!(error = %e, "authentication check failed");
                false
            },
        }
    }

    /// Forward the login QR code to the relay and wait for it to be scanned.
    pub async fn authenticate(&mut self) -> Result<()> {
        let driver = self.driver.as_deref().ok_or(SessionError::NotStarted)?;
        info!("WhatsApp is not logged in, waiting for QR code");

        let qr_timeout = Duration::from_secs(self.config.qr_timeout_secs);
        let qr = wait_for(driver, &locators::QR_CODE, qr_timeout)
            .await
            .map_err(|e| SessionError::AuthenticationFailed(format!("QR code lookup failed: {e}")))?
            .ok_or_else(|| {
                SessionError::AuthenticationFailed(format!(
                    "QR code did not appear within {}s",
                    self.config.qr_timeout_secs
                ))
            })?;

        let png = driver.screenshot_png().await.map_err(|e| {
            SessionError::AuthenticationFailed(format!("failed to capture QR code: {e}"))
        })?;
        self.relay.send_image(png, QR_CAPTION).await.map_err(|e| {
            SessionError::AuthenticationFailed(format!("failed to deliver QR code: {e:#}"))
        })?;
        info!("QR code sent, waiting for it to be scanned");

        let scan_timeout = Duration::from_secs(self.config.qr_scan_timeout_secs);
        let scanned = wait_until_stale(driver, qr, scan_timeout)
            .await
            .map_err(|e| SessionError::AuthenticationFailed(format!("QR code check failed: {e}")))?;
        if !scanned {
            return Err(SessionError::AuthenticationFailed(format!(
                "QR code was not scanned within {}s",
                self.config.qr_scan_timeout_secs
            )));
        }

        if !self.is_authenticated().await {
            return Err(SessionError::AuthenticationFailed(
                "chat list did not appear after scanning".into(),
            ));
        }
        self.state = SessionState::Authenticated;
        info!("WhatsApp authenticated");
        Ok(())
    }

    /// Close the browser if one is running. Idempotent.
    pub async fn stop(&mut self) {
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.close().await {
                warn!(error = %e, "failed to close browser");
            }
            info!("WhatsApp session stopped");
        }
        self.state = SessionState::Stopped;
    }

    /// Replace the browser with a fresh one.
    pub async fn restart(&mut self) -> Result<()> {
        info!("restarting WhatsApp session");
        self.stop().await;
        self.state = SessionState::Restarting;
        if let Err(e) = self.start().await {
            self.stop().await;
            return Err(e);
        }
        Ok(())
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.config.settle_delay_ms)
    }
}

#[async_trait]
impl ChatSession for WhatsAppClient {
    async fn start(&mut self) -> anyhow::Result<()> {
        Ok(WhatsAppClient::start(self).await?)
    }

    async fn stop(&mut self) {
        WhatsAppClient::stop(self).await;
    }

    async fn get_new_messages(&mut self) -> anyhow::Result<Vec<InboundMessage>> {
        let settle = self.settle_delay();
        let driver = self.driver.as_deref().ok_or(SessionError::NotStarted)?;

        let result = extract::read_unread_chats(driver, settle).await;
        match result {
            Ok(messages) => Ok(messages),
            Err(e) => {
                warn!(
                    error = %e,
                    connection_lost = e.is_connection_lost(),
                    "browser failed while reading chats, restarting session"
                );
                self.restart().await?;
                Ok(Vec::new())
            },
        }
    }

    async fn send_message(&mut self, chat: &str, text: &str) -> anyhow::Result<()> {
        let settle = self.settle_delay();
        let search_timeout = Duration::from_secs(self.config.search_timeout_secs);
        let driver = self.driver.as_deref().ok_or(SessionError::NotStarted)?;

        let result = dispatch::send_reply(driver, chat, text, search_timeout, settle).await;
        match result {
            Ok(Delivery::Sent | Delivery::Dropped) => Ok(()),
            Err(e) => {
                warn!(
                    chat,
                    error = %e,
                    connection_lost = e.is_connection_lost(),
                    "browser failed while sending reply, restarting session"
                );
                self.restart().await?;
                Ok(())
            },
        }
    }
}
