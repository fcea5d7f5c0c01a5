mod browser_commands;
mod config_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Result,
    clap::{Parser, Subcommand},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
    wa2tg_bridge::Bridge,
    wa2tg_browser::CdpLauncher,
    wa2tg_common::Relay,
    wa2tg_telegram::TelegramRelay,
    wa2tg_whatsapp::WhatsAppClient,
};

#[derive(Parser)]
#[command(name = "wa2tg", about = "Read and answer WhatsApp messages from Telegram")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of searching ./ and ~/.config/wa2tg/.
    #[arg(long, global = true, env = "WA2TG_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge (default when no subcommand is provided).
    Run,
    /// Browser diagnostics.
    Browser {
        #[command(subcommand)]
        action: browser_commands::BrowserAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Resolves with the name of the first shutdown signal received.
async fn shutdown_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        let mut hangup = signal(SignalKind::hangup())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
            _ = terminate.recv() => Ok("SIGTERM"),
            _ = hangup.recv() => Ok("SIGHUP"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
    }
}

async fn run_bridge(config_path: Option<PathBuf>) -> Result<()> {
    let config = wa2tg_config::load(config_path.as_deref())?;

    let relay: Arc<dyn Relay> = Arc::new(TelegramRelay::from_config(&config.telegram)?);
    let session = WhatsAppClient::new(
        config.whatsapp.clone(),
        Arc::new(CdpLauncher),
        Arc::clone(&relay),
    );
    let bridge = Bridge::new(Box::new(session), relay, &config.bridge);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(signal) => {
                info!(signal, "received exit signal");
                signal_cancel.cancel();
            },
            Err(e) => warn!(error = %e, "failed to listen for shutdown signals"),
        }
    });

    bridge.run(cancel).await?;
    info!("shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "wa2tg starting");

    match cli.command {
        None | Some(Commands::Run) => run_bridge(cli.config).await,
        Some(Commands::Browser { action }) => {
            browser_commands::handle_browser(action, cli.config.as_deref())
        },
        Some(Commands::Config { action }) => {
            config_commands::handle_config(action, cli.config.as_deref())
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, clap::CommandFactory};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_invocation_runs_the_bridge() {
        let cli = Cli::try_parse_from(["wa2tg"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
        assert!(!cli.json_logs);
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from([
            "wa2tg",
            "browser",
            "detect",
            "--config",
            "/etc/wa2tg.toml",
            "--json-logs",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Browser { .. })));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/wa2tg.toml")));
        assert!(cli.json_logs);
    }
}
