//! Browser error types.

use thiserror::Error;

/// Errors that can occur during browser operations.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser not available: Chrome/Chromium not found\n\n{0}")]
    BrowserNotAvailable(String),

    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    #[error("element not found: ref {0}")]
    ElementNotFound(u32),

    #[error("invalid locator `{name}`: {reason}")]
    InvalidLocator { name: &'static str, reason: String },

    #[error("JavaScript evaluation failed: {0}")]
    JsEvalFailed(String),

    #[error("screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("browser session is closed")]
    SessionClosed,

    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BrowserError {
    /// Whether the error means the browser process or its websocket is gone,
    /// as opposed to a page-level failure.
    pub fn is_connection_lost(&self) -> bool {
        match self {
            Self::SessionClosed | Self::ConnectionClosed(_) => true,
            Self::Cdp(msg) | Self::NavigationFailed(msg) | Self::JsEvalFailed(msg) => {
                msg.contains("AlreadyClosed") || msg.contains("ConnectionClosed")
            },
            _ => false,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Cdp(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BrowserError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_websocket_counts_as_connection_loss() {
        assert!(BrowserError::Cdp("ws error: AlreadyClosed".into()).is_connection_lost());
        assert!(BrowserError::SessionClosed.is_connection_lost());
        assert!(!BrowserError::ElementNotFound(3).is_connection_lost());
        assert!(!BrowserError::Cdp("Node is detached".into()).is_connection_lost());
    }
}
