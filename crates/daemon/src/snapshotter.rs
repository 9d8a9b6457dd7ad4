// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background snapshot scheduler

use std::sync::Arc;
use std::time::Duration;

use rl_storage::{DurableStore, SnapshotStats};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Start the scheduler task
///
/// The first cycle runs one full `period` after this call. The task exits
/// once `shutdown` flips to `true` or its sender is dropped.
pub fn spawn(
    store: Arc<DurableStore>,
    period: Duration,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run(store, period, shutdown))
}

async fn run(store: Arc<DurableStore>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Skip initial immediate tick
    timer.tick().await;

    info!(period = ?period, "snapshot scheduler started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = timer.tick() => {
                run_cycle(&store).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!("snapshot scheduler stopped");
}

/// Run one snapshot cycle on the blocking pool
///
/// Failures are logged and leave the log untouched; the next tick tries
/// again.
pub async fn run_cycle(store: &Arc<DurableStore>) -> Option<SnapshotStats> {
    let store = Arc::clone(store);
    match tokio::task::spawn_blocking(move || store.snapshot()).await {
        Ok(Ok(stats)) => {
            info!(
                lists = stats.lists,
                elements = stats.elements,
                bytes = stats.bytes,
                records_truncated = stats.records_truncated,
                "snapshot cycle complete"
            );
            Some(stats)
        }
        Ok(Err(e)) => {
            error!(error = %e, "snapshot cycle failed");
            None
        }
        Err(e) => {
            error!(error = %e, "snapshot task failed");
            None
        }
    }
}

#[cfg(test)]
#[path = "snapshotter_tests.rs"]
mod tests;
