//! Evaldash CLI: terminal front end for exploring evaluation results through
//! cascading corpus, topic, and query-group filters.
//!
//! Provides an interactive session plus one-shot subcommands.

mod commands;
mod repl;

use anyhow::Context;
use clap::Parser;
use evaldash_core::{
    CascadeController, CatalogGateway, DashboardConfig, HttpGateway, MockGateway, load_config,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Evaldash: browse evaluation results by metric, version, corpus, topic, and query group
#[derive(Parser, Debug)]
#[command(name = "evaldash", version, about, long_about = None)]
struct Cli {
    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the evaluation backend
    #[arg(long)]
    base_url: Option<String>,

    /// Refresh period in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Use the built-in sample catalog instead of a backend
    #[arg(long)]
    offline: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Load the catalog once and print it with the active request as JSON
    Snapshot,
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Show the resolved configuration
    Show,
    /// Check the resolved configuration for problems
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "evaldash", "evaldash")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "evaldash.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut config = load_config(Some(&workspace), cli.config.as_deref(), None)?;

    // Apply CLI overrides
    if let Some(base_url) = &cli.base_url {
        config.gateway.base_url = base_url.clone();
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.refresh.interval_ms = interval_ms;
    }

    match cli.command {
        Some(Commands::Config { action }) => commands::handle_config(action, &config),
        Some(Commands::Snapshot) => {
            let controller = build_controller(&config, cli.offline)?;
            commands::print_snapshot(&controller).await
        }
        None => {
            let controller = build_controller(&config, cli.offline)?;
            repl::run_interactive(controller, config).await
        }
    }
}

/// Pick the gateway and wrap it in a controller. Refuses an invalid config.
fn build_controller(config: &DashboardConfig, offline: bool) -> anyhow::Result<CascadeController> {
    config.check()?;

    let gateway: Arc<dyn CatalogGateway> = if offline {
        tracing::info!("Using built-in sample catalog");
        Arc::new(MockGateway::sample())
    } else {
        Arc::new(HttpGateway::new(&config.gateway).context("Failed to create HTTP gateway")?)
    };
    Ok(CascadeController::new(gateway))
}

#[cfg(test)]
mod tests {
    use super::*;
    use evaldash_core::ConfigError;

    #[test]
    fn test_build_controller_refuses_invalid_config() {
        let mut config = DashboardConfig::default();
        config.refresh.interval_ms = 0;

        let err = build_controller(&config, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_build_controller_offline() {
        assert!(build_controller(&DashboardConfig::default(), true).is_ok());
    }
}
