//! fanctl Daemon (fanctld)
//!
//! Runs a single fan controller until it is told to stop.
//!
//! # Lifecycle
//! - **Startup**: parse arguments, initialise logging, load and validate settings
//! - **Run**: the controller polls in the background; `SIGHUP` reloads settings
//! - **Shutdown**: `SIGINT`/`SIGTERM` stop the loop and wait for it to exit

mod cli;
mod devices;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use fc_core::{load_settings, DeviceRegistry, FanController};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

use cli::Cli;
use devices::DirectoryRegistry;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Set up tracing, preferring the systemd journal when it is available
///
/// Returns true when logging goes to the journal.
fn init_logging() -> bool {
    let log_level = std::env::var("FANCTL_LOG").unwrap_or_else(|_| "info".to_string());

    if Path::new("/run/systemd/journal/socket").exists() {
        match tracing_journald::layer() {
            Ok(journald_layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry()
                    .with(journald_layer)
                    .with(tracing_subscriber::EnvFilter::new(&log_level))
                    .init();
                return true;
            }
            Err(e) => {
                eprintln!("Failed to create journald layer: {}, falling back to stdout", e);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(&log_level)
        .init();
    false
}

/// Re-read the settings file and apply it to the running controller
async fn reload(controller: &FanController, config: &Path, registry: &dyn DeviceRegistry) {
    let settings = match load_settings(config) {
        Ok(settings) => settings,
        Err(e) => {
            error!(path = %config.display(), error = %e, "Failed to reload configuration");
            return;
        }
    };

    match controller.reconfigure(&settings, registry).await {
        Ok(()) => info!(fan = %controller.name(), "Configuration reloaded"),
        Err(e) => error!(fan = %controller.name(), error = %e, "Rejected new configuration"),
    }
}

/// Serve signals until asked to stop
async fn run(controller: &FanController, cli: &Cli, registry: &dyn DeviceRegistry) -> anyhow::Result<()> {
    let mut hangup = signal(SignalKind::hangup()).context("installing SIGHUP handler")?;
    let mut terminate = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;

    loop {
        tokio::select! {
            _ = hangup.recv() => {
                info!("SIGNAL: Received SIGHUP - reloading configuration");
                reload(controller, &cli.config, registry).await;
            }
            _ = terminate.recv() => {
                info!("SIGNAL: Received SIGTERM - initiating shutdown");
                break;
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for SIGINT: {}", e);
                }
                info!("SIGNAL: Received SIGINT - initiating shutdown");
                break;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let use_journald = init_logging();

    info!("STARTUP: fanctld {} starting", VERSION);
    info!("STARTUP: Logging to {}", if use_journald { "systemd journal" } else { "stdout" });

    let settings = load_settings(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    settings
        .validate()
        .with_context(|| format!("validating {}", cli.config.display()))?;
    info!(kind = settings.kind(), devices = %cli.devices.display(), "STARTUP: Configuration loaded");

    let registry = DirectoryRegistry::new(&cli.devices);
    let controller = FanController::new(cli.name.clone(), &settings, &registry)
        .await
        .context("starting fan controller")?;

    if cli.once {
        let status = controller.status().await;
        controller.shutdown().await?;
        println!("{}", serde_json::to_string(&status?)?);
        return Ok(());
    }

    info!(fan = %controller.name(), "Fan control loop started");
    let result = run(&controller, &cli, &registry).await;

    controller.shutdown().await.context("stopping fan controller")?;
    info!("SHUTDOWN: Daemon terminated gracefully");
    result
}
