//! Configuration validation.
//!
//! Produces diagnostics instead of failing on the first problem so the
//! startup error lists everything that needs fixing at once.

use crate::schema::Wa2tgConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "telegram.chat_id"
    pub path: &'static str,
    pub message: String,
}

impl Diagnostic {
    fn error(path: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path,
            message: message.into(),
        }
    }

    fn warning(path: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path,
            message: message.into(),
        }
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Keep only the errors, or `Ok` when there are none.
    pub fn into_result(self) -> crate::Result<Vec<Diagnostic>> {
        if self.has_errors() {
            let errors = self
                .diagnostics
                .into_iter()
                .filter(|d| d.severity == Severity::Error)
                .collect();
            Err(crate::Error::Invalid(errors))
        } else {
            Ok(self.diagnostics)
        }
    }
}

/// Check a fully merged configuration (file + env overrides).
pub fn validate(config: &Wa2tgConfig) -> ValidationResult {
    let mut diagnostics = Vec::new();

    if !config.telegram.has_token() {
        diagnostics.push(Diagnostic::error(
            "telegram.token",
            "bot token is required (set TELEGRAM_BOT_TOKEN)",
        ));
    }

    if config.telegram.chat_id.trim().is_empty() {
        diagnostics.push(Diagnostic::error(
            "telegram.chat_id",
            "target chat id is required (set TELEGRAM_CHAT_ID)",
        ));
    } else if config.telegram.chat_id().is_none() {
        diagnostics.push(Diagnostic::error(
            "telegram.chat_id",
            format!("`{}` is not a numeric chat id", config.telegram.chat_id),
        ));
    }

    let wa = &config.whatsapp;
    if !wa.url.starts_with("https://") && !wa.url.starts_with("http://") {
        diagnostics.push(Diagnostic::error(
            "whatsapp.url",
            format!("`{}` is not an http(s) URL", wa.url),
        ));
    }
    if wa.viewport_width == 0 || wa.viewport_height == 0 {
        diagnostics.push(Diagnostic::error(
            "whatsapp.viewport_width",
            "viewport dimensions must be non-zero",
        ));
    }
    if wa.user_data_dir.as_os_str().is_empty() {
        diagnostics.push(Diagnostic::error(
            "whatsapp.user_data_dir",
            "a profile directory is required to keep the login across restarts",
        ));
    }
    if wa.qr_scan_timeout_secs < 10 {
        diagnostics.push(Diagnostic::warning(
            "whatsapp.qr_scan_timeout_secs",
            "less than 10s leaves little time to scan the QR code",
        ));
    }

    if config.bridge.poll_interval_secs == 0 {
        diagnostics.push(Diagnostic::warning(
            "bridge.poll_interval_secs",
            "0 polls WhatsApp Web back-to-back",
        ));
    }

    ValidationResult { diagnostics }
}
