// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

use std::fs::File;
use std::future::Future;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use fs2::FileExt;
use rl_storage::{DurableStore, RecoveryError, RecoveryReport};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::server::{self, ServerContext};
use crate::snapshotter;

/// Daemon state between startup and shutdown
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    lock_file: File,
    /// TCP listener, bound last during startup
    pub listener: TcpListener,
    /// The recovered list store
    pub store: Arc<DurableStore>,
    /// What recovery found on disk
    pub report: RecoveryReport,
}

impl DaemonState {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `stop` resolves or a client sends `Shutdown`, then shut
    /// down gracefully
    pub async fn run<F>(self, stop: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = ()>,
    {
        let DaemonState {
            config,
            lock_file,
            listener,
            store,
            report: _,
        } = self;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ctx = Arc::new(ServerContext::new(Arc::clone(&store), shutdown_tx));

        let scheduler = snapshotter::spawn(
            Arc::clone(&store),
            config.settings.snapshot_interval,
            shutdown_rx.clone(),
        );
        let accept_loop = tokio::spawn(server::serve(listener, Arc::clone(&ctx)));

        let mut requested = shutdown_rx;
        tokio::select! {
            _ = stop => {}
            _ = requested.wait_for(|stop| *stop) => {
                info!("Shutdown requested via IPC, shutting down...");
            }
        }

        // Stop the scheduler and accept loop before touching the files
        ctx.request_shutdown();
        if let Err(e) = scheduler.await {
            error!("Snapshot scheduler task failed: {}", e);
        }
        if let Err(e) = accept_loop.await {
            error!("Accept loop task failed: {}", e);
        }

        shutdown(&config, &store);
        drop(lock_file);
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind {0}: {1}")]
    BindFailed(String, std::io::Error),

    #[error("Recovery failed during {}: {}", .0.phase(), .0)]
    Recovery(#[from] RecoveryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Create data directory (needed for the lock file and the store)
    std::fs::create_dir_all(&config.data_dir)?;

    // 2. Acquire lock file FIRST - prevents two daemons on one data dir
    let lock_file = File::options()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    match startup_locked(config, lock_file).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // Clean up any resources created before failure
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

/// Startup logic once the lock is held - cleanup_on_failure called if this fails
async fn startup_locked(config: &Config, lock_file: File) -> Result<DaemonState, LifecycleError> {
    // Write PID to lock file
    lock_file.set_len(0)?;
    let mut lock_file = lock_file;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Recover the store before binding (fail fast, don't accept connections)
    let (store, report) = DurableStore::open(config.store_config())?;

    info!(
        snapshot_loaded = report.snapshot_loaded,
        records_applied = report.records_applied,
        malformed_lines = report.malformed_lines,
        skipped_removes = report.skipped_removes,
        torn_tail_bytes = report.torn_tail_bytes,
        "Loaded state from {}",
        config.data_dir.display()
    );

    // 4. Bind listener (LAST - only after all validation passes)
    let addr = &config.settings.listen_addr;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(addr.clone(), e))?;

    info!("Daemon started for data dir: {}", config.data_dir.display());

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        store: Arc::new(store),
        report,
    })
}

/// Flush the log and remove the PID file
fn shutdown(config: &Config, store: &DurableStore) {
    info!("Shutting down daemon...");

    if let Err(e) = store.sync() {
        warn!("Failed to sync log: {}", e);
    }

    if config.lock_path.exists() {
        if let Err(e) = std::fs::remove_file(&config.lock_path) {
            warn!("Failed to remove PID file: {}", e);
        }
    }

    info!("Daemon shutdown complete");
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
