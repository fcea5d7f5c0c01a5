//! Configuration loading, validation, env substitution, and env overrides.
//!
//! Config files: `wa2tg.toml`, `wa2tg.yaml`, or `wa2tg.json`
//! Searched in `./` then `~/.config/wa2tg/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file. `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID` from the environment
//! override whatever the file says.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, discover_and_load, find_config_file, load, load_config,
    },
    schema::{BridgeConfig, TelegramConfig, Wa2tgConfig, WhatsAppConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
