//! PingPal Binary Entry Point
//!
//! Runs the endpoint monitor, or prints a status report from its history.
//! Core functionality is provided by the `pingpal` library crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use pingpal::{
    config::{AppConfig, parse_duration},
    report::StatusReport,
    supervisor::{MonitorConfig, Supervisor},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// PingPal - HTTP endpoint monitor
#[derive(Parser, Debug)]
#[command(name = "pingpal", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "endpoints.yml", env = "PINGPAL_CONFIG")]
    config: PathBuf,

    /// Database path (overrides config file)
    #[arg(long, env = "PINGPAL_DB")]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe all configured endpoints until interrupted (default)
    Run,
    /// Print the latest result and uptime for every endpoint
    Status {
        /// Summary window, e.g. 1h, 24h, 7d
        #[arg(long, default_value = "24h", value_parser = parse_duration)]
        window: Duration,

        /// Only report on this endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pingpal=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&cli.config, cli.db_path).await,
        Command::Status {
            window,
            endpoint,
            json,
        } => status(&cli.config, cli.db_path, window, endpoint.as_deref(), json).await,
    }
}

async fn run(
    config_path: &Path,
    db_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Loading configuration from: {}", config_path.display());
    let config = AppConfig::load(config_path)?;

    let mut monitor = MonitorConfig::from_app_config(&config)?;
    if let Some(path) = db_path {
        monitor.db_path = path;
    }

    tracing::info!(
        "Endpoints: {}, Database: {}",
        monitor.endpoints.len(),
        monitor.db_path.display()
    );
    tracing::info!("Press Ctrl+C to shutdown");

    Supervisor::new(monitor).run(shutdown_signal()).await?;
    Ok(())
}

async fn status(
    config_path: &Path,
    db_path: Option<PathBuf>,
    window: Duration,
    endpoint: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = match db_path {
        Some(path) => path,
        None => AppConfig::load(config_path)?.database.path,
    };
    if !db_path.exists() {
        return Err(format!("no history database at '{}'", db_path.display()).into());
    }

    let since = chrono::Utc::now() - chrono::Duration::from_std(window)?;
    let report = StatusReport::from_file(&db_path, since, endpoint).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Window: last {} (since {})",
            humantime::format_duration(window),
            since.format("%Y-%m-%d %H:%M:%S UTC")
        );
        print!("{}", report.render_table());
    }
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
