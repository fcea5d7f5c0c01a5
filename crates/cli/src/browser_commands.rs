//! CLI subcommands for the WhatsApp browser.

use std::path::Path;

use {anyhow::Result, clap::Subcommand, wa2tg_browser::detect};

#[derive(Subcommand)]
pub enum BrowserAction {
    /// Show which Chromium executable would be launched.
    Detect,
}

pub fn handle_browser(action: BrowserAction, config_path: Option<&Path>) -> Result<()> {
    match action {
        BrowserAction::Detect => detect(config_path),
    }
}

fn detect(config_path: Option<&Path>) -> Result<()> {
    let mut config = match config_path {
        Some(path) => wa2tg_config::load_config(path)?,
        None => wa2tg_config::discover_and_load(),
    };
    wa2tg_config::apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    let wa = &config.whatsapp;

    let result = detect::detect_browser(wa.chrome_path.as_deref());
    match result.executable {
        Some(found) => {
            println!("Browser: {} (from {})", found.path.display(), found.source);
        },
        None => {
            eprintln!("{}", result.install_hint);
            std::process::exit(1);
        },
    }

    println!("  profile:   {}", wa.user_data_dir.display());
    println!("  headless:  {}", wa.headless);
    println!("  locale:    {}", wa.locale);
    println!("  viewport:  {}x{}", wa.viewport_width, wa.viewport_height);
    if !wa.chrome_args.is_empty() {
        println!("  extra args: {:?}", wa.chrome_args);
    }
    Ok(())
}
