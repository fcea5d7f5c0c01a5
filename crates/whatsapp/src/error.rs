use {thiserror::Error, wa2tg_browser::BrowserError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to launch browser: {0}")]
    LaunchFailed(#[source] BrowserError),

    #[error("WhatsApp authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("WhatsApp session is not started")]
    NotStarted,

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
