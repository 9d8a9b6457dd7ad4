// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! remotelist daemon (rld)
//!
//! Background process that owns the data directory and serves list
//! operations.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::Path;

use rl_daemon::config::{self, Config};
use rl_daemon::lifecycle::{self, LifecycleError};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let data_dir = config::resolve_data_dir(args.get(1).map(String::as_str))?;
    std::fs::create_dir_all(&data_dir)?;

    // Load configuration
    let config = Config::load(&data_dir)?;

    // Write startup marker to log (before tracing setup, so it is never lost)
    write_startup_marker(&config)?;

    // Set up logging
    let log_guard = setup_logging(&config)?;

    info!("Starting rld for data dir: {}", data_dir.display());

    // Start daemon
    let daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        addr = %daemon.local_addr()?,
        snapshot_interval = ?config.settings.snapshot_interval,
        sync_writes = config.settings.sync_writes,
        "Daemon ready"
    );

    // Signal ready for parent process (e.g., systemd, scripts waiting for startup)
    println!("READY");

    let result = daemon
        .run(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
            }
        })
        .await;

    if let Err(e) = &result {
        error!("Daemon stopped with error: {}", e);
    } else {
        info!("Daemon stopped");
    }
    drop(log_guard);
    Ok(result?)
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- rld: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- rld: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
/// This ensures the error is visible even if the process exits quickly.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (dir, file_name) = split_log_path(&config.log_path)?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Set up subscriber with env filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr), LifecycleError> {
    let invalid = || {
        LifecycleError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid log path: {}", path.display()),
        ))
    };
    let dir = path.parent().ok_or_else(invalid)?;
    let file_name = path.file_name().ok_or_else(invalid)?;
    Ok((dir, file_name))
}
