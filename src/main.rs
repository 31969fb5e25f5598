//! System configuration daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   daemon.conf ──▶ parser ──▶ ┌──────────────────────┐
//!                              │  reload coordinator  │
//!                              │   (mutex + table)    │
//!                              └──────────▲───────────┘
//!                                         │ reload / snapshot
//!                              ┌──────────┴───────────┐
//!   SIGHUP / SIGUSR1 ──▶ flags │   dispatch loop      │◀── bus ◀── HTTP gateway
//!   file watcher ──────▶ flags │ (bounded 1s wait)    │            ◀── sysconf-ctl
//!                              └──────────────────────┘
//! ```
//!
//! Exit status is 0 after a graceful shutdown and 1 when startup fails.

use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;

use sysconf_daemon::config::{load_config, ConfigError, DaemonConfig, ReloadMode};
use sysconf_daemon::observability::logging::init_tracing;
use sysconf_daemon::Daemon;

#[derive(Parser)]
#[command(name = "sysconf-daemon")]
#[command(about = "Serves an INI configuration file over the bus", long_about = None)]
struct Cli {
    /// Daemon settings file (TOML).
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// INI file to serve, overriding the settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hash bucket count of the configuration table.
    #[arg(long)]
    buckets: Option<usize>,

    /// Drop keys that disappeared from the file on reload.
    #[arg(long)]
    replace: bool,

    /// Enable the HTTP gateway on this address.
    #[arg(long)]
    gateway: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

fn build_config(cli: &Cli) -> Result<DaemonConfig, ConfigError> {
    let mut config = match &cli.settings {
        Some(path) => load_config(path)?,
        None => DaemonConfig::default(),
    };

    if let Some(path) = &cli.config {
        config.config_path = path.clone();
    }
    if let Some(buckets) = cli.buckets {
        config.bucket_count = buckets;
    }
    if cli.replace {
        config.reload_mode = ReloadMode::Replace;
    }
    if let Some(address) = &cli.gateway {
        config.gateway.enabled = true;
        config.gateway.bind_address = address.clone();
    }
    if cli.json_logs {
        config.logging.json = true;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sysconf-daemon: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = %config.config_path.display(),
        service_name = %config.bus.service_name,
        reload_mode = ?config.reload_mode,
        "sysconf-daemon starting"
    );

    let daemon = match Daemon::load(config) {
        Ok(daemon) => daemon,
        Err(e) => {
            tracing::error!(error = %e, "Fatal startup error");
            return ExitCode::FAILURE;
        }
    };

    match daemon.run().await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal startup error");
            ExitCode::FAILURE
        }
    }
}
