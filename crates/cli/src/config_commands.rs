use std::path::Path;

use {
    anyhow::Result,
    clap::Subcommand,
    wa2tg_config::{Severity, validate},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration (file and environment) and report problems.
    Check,
    /// Print where the config file is looked up.
    Path,
}

pub fn handle_config(action: ConfigAction, config_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Check => check(config_path),
        ConfigAction::Path => {
            match config_path
                .map(Path::to_path_buf)
                .or_else(wa2tg_config::find_config_file)
            {
                Some(path) => println!("{}", path.display()),
                None => {
                    println!("No config file found. Looked for wa2tg.toml in:");
                    println!("  ./");
                    if let Some(dir) = wa2tg_config::config_dir() {
                        println!("  {}", dir.display());
                    }
                },
            }
            Ok(())
        },
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(config_path: Option<&Path>) -> Result<()> {
    let mut config = match config_path {
        Some(path) => {
            eprintln!("Checking {}\n", path.display());
            wa2tg_config::load_config(path)?
        },
        None => {
            match wa2tg_config::find_config_file() {
                Some(path) => eprintln!("Checking {}\n", path.display()),
                None => eprintln!("No config file found; checking defaults and environment.\n"),
            }
            wa2tg_config::discover_and_load()
        },
    };
    wa2tg_config::apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    let result = validate(&config);
    for d in &result.diagnostics {
        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
        };
        eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if !result.diagnostics.is_empty() {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}
