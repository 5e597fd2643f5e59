//! rangecron - recurring cron jobs bounded by start/end date windows
//!
//! Main entry point for the rangecron CLI and scheduler.

mod cli;
mod commands;
mod factory;

use clap::Parser;
use tracing::warn;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use rangecron_config::{ConfigLoader, ConfigValidator, LoggingConfig};

use crate::cli::{Cli, Commands};

/// Initialize tracing with console and file output.
///
/// Log files are written to the configured directory with daily rotation.
/// `RUST_LOG` overrides the configured level.
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&logging.directory)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("rangecron")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&logging.directory)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keeps the background writer alive for the program duration.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = ConfigLoader::load_or_default(cli.config.as_deref())?;
    config.validate()?;
    init_tracing(&config.logging)?;

    for warning in ConfigValidator::validate(&config).warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }

    match cli.command {
        Commands::Run => commands::run(&config).await,
        Commands::Add(args) => commands::add(&config, args).await,
        Commands::Remove { id } => commands::remove(&config, &id).await,
        Commands::Trigger { id } => commands::trigger(&config, &id).await,
        Commands::List => commands::list(&config).await,
    }
}
