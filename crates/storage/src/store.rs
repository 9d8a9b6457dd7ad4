// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable list store
//!
//! Wraps the in-memory state, the log, and the snapshot file behind a
//! single lock. Mutations are validated, logged, and only then applied, so
//! a failed log write leaves memory exactly as it was.

use crate::recovery::{recover, RecoveryError, RecoveryReport};
use crate::snapshot::{SnapshotError, SnapshotManager};
use crate::state::ListState;
use crate::wal::{Wal, WalError};
use chrono::{DateTime, Utc};
use rl_core::{ListError, Record};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Log file name inside the data directory
pub const LOG_FILE: &str = "log.txt";
/// Snapshot file name inside the data directory
pub const SNAPSHOT_FILE: &str = "snapshot.dat";

/// Errors returned by store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    List(#[from] ListError),
    #[error("log write failed: {0}")]
    IoFailure(#[from] WalError),
    #[error("snapshot failed: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl StoreError {
    /// The list error, when the failure was a domain error
    pub fn as_list_error(&self) -> Option<&ListError> {
        match self {
            StoreError::List(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    /// fsync the log after every record
    pub sync_writes: bool,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            sync_writes: true,
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }
}

/// Result of one snapshot cycle
#[derive(Debug, Clone)]
pub struct SnapshotStats {
    pub lists: usize,
    pub elements: usize,
    pub bytes: u64,
    pub taken_at: DateTime<Utc>,
    /// Log records made redundant by this snapshot
    pub records_truncated: u64,
}

/// Point-in-time counters for status reporting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub lists: usize,
    pub elements: usize,
    pub records_since_snapshot: u64,
    pub snapshots_taken: u64,
    pub last_snapshot: Option<DateTime<Utc>>,
}

struct StoreInner {
    state: ListState,
    wal: Wal,
    snapshots: SnapshotManager,
    records_since_snapshot: u64,
    snapshots_taken: u64,
    last_snapshot: Option<DateTime<Utc>>,
}

/// Named integer lists with write-ahead logging and snapshots
///
/// All operations, including the snapshot cycle, serialize on one mutex.
pub struct DurableStore {
    config: StoreConfig,
    inner: Mutex<StoreInner>,
}

impl DurableStore {
    /// Recover from the data directory and return a store ready to serve
    pub fn open(config: StoreConfig) -> Result<(Self, RecoveryReport), RecoveryError> {
        let snapshots = SnapshotManager::new(&config.snapshot_path());
        let recovered = recover(&snapshots, &config.log_path(), config.sync_writes)?;
        let report = recovered.report;

        let inner = StoreInner {
            state: recovered.state,
            wal: recovered.wal,
            snapshots,
            records_since_snapshot: report.records_applied,
            snapshots_taken: 0,
            last_snapshot: report.snapshot_taken_at,
        };

        let store = Self {
            config,
            inner: Mutex::new(inner),
        };
        Ok((store, report))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append `value` to the tail of `list_id`, creating the list if needed
    pub fn append(&self, list_id: &str, value: i64) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.wal.append(&Record::append(list_id, value))?;
        inner.state.append(list_id, value);
        inner.records_since_snapshot += 1;
        Ok(())
    }

    /// Remove and return the tail value of `list_id`
    ///
    /// Nothing is logged for a remove that would fail.
    pub fn remove(&self, list_id: &str) -> Result<i64, StoreError> {
        let mut inner = self.lock();
        inner.state.peek_tail(list_id)?;
        inner.wal.append(&Record::remove(list_id))?;
        let value = inner.state.remove(list_id)?;
        inner.records_since_snapshot += 1;
        Ok(value)
    }

    pub fn get(&self, list_id: &str, index: i64) -> Result<i64, StoreError> {
        Ok(self.lock().state.get(list_id, index)?)
    }

    pub fn size(&self, list_id: &str) -> Result<usize, StoreError> {
        Ok(self.lock().state.size(list_id)?)
    }

    /// Write a snapshot of the current state and truncate the log
    ///
    /// Holds the lock for the whole cycle. If the snapshot cannot be
    /// written the log is left untouched.
    pub fn snapshot(&self) -> Result<SnapshotStats, StoreError> {
        let mut inner = self.lock();
        let meta = inner.snapshots.save(&inner.state)?;

        if let Err(first) = inner.wal.reset() {
            warn!(error = %first, "log truncation failed after snapshot, retrying");
            if let Err(e) = inner.wal.reset() {
                error!(
                    error = %e,
                    records = inner.records_since_snapshot,
                    "snapshot written but log not truncated, a restart now would apply these records twice"
                );
                return Err(e.into());
            }
        }

        let records_truncated = inner.records_since_snapshot;
        inner.records_since_snapshot = 0;
        inner.snapshots_taken += 1;
        inner.last_snapshot = Some(meta.taken_at);

        debug!(
            lists = meta.lists,
            elements = meta.elements,
            bytes = meta.size_bytes,
            records_truncated,
            "snapshot cycle complete"
        );

        Ok(SnapshotStats {
            lists: meta.lists,
            elements: meta.elements,
            bytes: meta.size_bytes,
            taken_at: meta.taken_at,
            records_truncated,
        })
    }

    pub fn stats(&self) -> StoreStats {
        let inner = self.lock();
        StoreStats {
            lists: inner.state.list_count(),
            elements: inner.state.element_count(),
            records_since_snapshot: inner.records_since_snapshot,
            snapshots_taken: inner.snapshots_taken,
            last_snapshot: inner.last_snapshot,
        }
    }

    /// Flush the log to disk, used on shutdown
    pub fn sync(&self) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.wal.sync()?;
        info!(path = %inner.wal.path().display(), "log synced");
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
