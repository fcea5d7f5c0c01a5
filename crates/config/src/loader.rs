use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::Wa2tgConfig,
    validate::validate,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["wa2tg.toml", "wa2tg.yaml", "wa2tg.yml", "wa2tg.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<Wa2tgConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./wa2tg.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/wa2tg/wa2tg.{toml,yaml,yml,json}` (user-global)
///
/// Returns `Wa2tgConfig::default()` if no config file is found or the file
/// cannot be parsed; the environment may still supply everything required.
pub fn discover_and_load() -> Wa2tgConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    Wa2tgConfig::default()
}

/// Build the effective configuration: file (explicit or discovered), then
/// process environment, then validation.
///
/// An explicit `path` must exist and parse. Any validation error is fatal.
pub fn load(path: Option<&Path>) -> Result<Wa2tgConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => discover_and_load(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    for diagnostic in validate(&config).into_result()? {
        warn!(
            path = diagnostic.path,
            severity = %diagnostic.severity,
            "{}",
            diagnostic.message
        );
    }

    info!(
        chat_id = %config.telegram.chat_id,
        profile = %config.whatsapp.user_data_dir.display(),
        headless = config.whatsapp.headless,
        "configuration loaded"
    );
    Ok(config)
}

/// Overlay environment variables on top of file values.
///
/// | variable               | setting                  |
/// |------------------------|--------------------------|
/// | `TELEGRAM_BOT_TOKEN`   | `telegram.token`         |
/// | `TELEGRAM_CHAT_ID`     | `telegram.chat_id`       |
/// | `WA2TG_USER_DATA_DIR`  | `whatsapp.user_data_dir` |
/// | `WA2TG_HEADLESS`       | `whatsapp.headless`      |
/// | `WA2TG_CHROME_PATH`    | `whatsapp.chrome_path`   |
pub fn apply_env_overrides(config: &mut Wa2tgConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(token) = non_empty("TELEGRAM_BOT_TOKEN") {
        config.telegram.token = secrecy::Secret::new(token);
    }
    if let Some(chat_id) = non_empty("TELEGRAM_CHAT_ID") {
        config.telegram.chat_id = chat_id;
    }
    if let Some(dir) = non_empty("WA2TG_USER_DATA_DIR") {
        config.whatsapp.user_data_dir = PathBuf::from(dir);
    }
    if let Some(headless) = non_empty("WA2TG_HEADLESS") {
        match headless.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => config.whatsapp.headless = true,
            "0" | "false" | "no" => config.whatsapp.headless = false,
            other => warn!(value = other, "ignoring unrecognised WA2TG_HEADLESS value"),
        }
    }
    if let Some(path) = non_empty("WA2TG_CHROME_PATH") {
        config.whatsapp.chrome_path = Some(path);
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/wa2tg/
    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/wa2tg/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "wa2tg").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<Wa2tgConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    let parse_err = |message: String| Error::Parse {
        path: path.to_path_buf(),
        message,
    };

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "json" => serde_json::from_str(raw).map_err(|e| parse_err(e.to_string())),
        _ => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}
