use clap::Parser;
use std::process;
use stowage::cli::commands::{EXIT_CONFIG, EXIT_FATAL};
use stowage::cli::{Cli, Commands};
use stowage::config::{load_config, LoggingConfig, StowageConfig};
use stowage::logging::init_logging;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Storage commands read the configuration before logging starts so the
    // configured level and log files apply
    let config = if cli.command.needs_config() {
        match load_config(&cli.config) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(EXIT_CONFIG);
            }
        }
    } else {
        None
    };

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let logging_config = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_else(LoggingConfig::default);

    let logging_guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_FATAL);
        }
    };

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Stowage starting");

    // Raised on SIGINT/SIGTERM; in-flight backend calls return Cancelled
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Received SIGINT (Ctrl+C), cancelling");
                        let _ = shutdown_tx.send(true);
                    }
                    return;
                }
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT (Ctrl+C), cancelling");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, cancelling");
                }
            }
            eprintln!("\n⚠️  Shutdown signal received, cancelling pending requests...");
            let _ = shutdown_tx.send(true);
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            } else {
                tracing::info!("Received SIGINT (Ctrl+C), cancelling");
                eprintln!("\n⚠️  Shutdown signal received, cancelling pending requests...");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let exit_code = match execute_command(&cli, config.as_ref(), shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    // Flush file logs before exiting
    drop(logging_guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(
    cli: &Cli,
    config: Option<&StowageConfig>,
    shutdown_signal: watch::Receiver<bool>,
) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Init(args) => args.execute().await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Blob(args) => {
            let config = config.ok_or_else(|| anyhow::anyhow!("Configuration not loaded"))?;
            args.execute(config, shutdown_signal).await
        }
        Commands::Table(args) => {
            let config = config.ok_or_else(|| anyhow::anyhow!("Configuration not loaded"))?;
            args.execute(config, shutdown_signal).await
        }
    }
}
