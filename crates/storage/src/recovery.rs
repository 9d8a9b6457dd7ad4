// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup recovery: snapshot load, then log replay
//!
//! ```text
//! INIT → LOADING_SNAPSHOT → REPLAYING_LOG → SERVING
//! ```
//!
//! A missing snapshot is a first run. A snapshot that exists but cannot be
//! decoded, or a log that cannot be read, aborts startup. Malformed log
//! lines and removes that find nothing to remove are skipped with a warning.

use crate::snapshot::{SnapshotError, SnapshotManager};
use crate::state::ListState;
use crate::wal::{LogEntry, Wal, WalError};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Where the store is in its startup sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPhase {
    Init,
    LoadingSnapshot,
    ReplayingLog,
    Serving,
}

impl fmt::Display for RecoveryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecoveryPhase::Init => "INIT",
            RecoveryPhase::LoadingSnapshot => "LOADING_SNAPSHOT",
            RecoveryPhase::ReplayingLog => "REPLAYING_LOG",
            RecoveryPhase::Serving => "SERVING",
        };
        f.write_str(name)
    }
}

/// Fatal startup failures. There is no degraded mode.
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("failed to load snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },
    #[error("failed to open log {path}: {source}")]
    LogOpen {
        path: PathBuf,
        #[source]
        source: WalError,
    },
    #[error("failed to scan log {path}: {source}")]
    LogScan {
        path: PathBuf,
        #[source]
        source: WalError,
    },
}

impl RecoveryError {
    /// The phase the failure happened in
    pub fn phase(&self) -> RecoveryPhase {
        match self {
            RecoveryError::Snapshot { .. } => RecoveryPhase::LoadingSnapshot,
            RecoveryError::LogOpen { .. } | RecoveryError::LogScan { .. } => {
                RecoveryPhase::ReplayingLog
            }
        }
    }
}

/// What recovery found and did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub snapshot_loaded: bool,
    pub snapshot_taken_at: Option<DateTime<Utc>>,
    pub records_applied: u64,
    pub malformed_lines: u64,
    pub skipped_removes: u64,
    /// Bytes cut from the end of the log because the last write was torn
    pub torn_tail_bytes: u64,
}

/// The outcome of a successful recovery, ready to serve
pub struct Recovered {
    pub state: ListState,
    pub wal: Wal,
    pub report: RecoveryReport,
}

/// Apply replayed log entries on top of `state`, in order
///
/// Removes against a missing or empty list are counted in the report and
/// skipped.
pub fn replay_into(state: &mut ListState, entries: &[LogEntry], report: &mut RecoveryReport) {
    for entry in entries {
        match state.apply(&entry.record) {
            Ok(()) => report.records_applied += 1,
            Err(e) => {
                warn!(
                    line = entry.line,
                    record = %entry.record,
                    error = %e,
                    "skipping log record that cannot be applied"
                );
                report.skipped_removes += 1;
            }
        }
    }
}

/// Rebuild the list state from the snapshot and log on disk
pub fn recover(
    snapshots: &SnapshotManager,
    log_path: &Path,
    sync_writes: bool,
) -> Result<Recovered, RecoveryError> {
    let mut report = RecoveryReport::default();
    let mut phase = RecoveryPhase::Init;
    info!(%phase, "starting recovery");

    phase = RecoveryPhase::LoadingSnapshot;
    info!(%phase, path = %snapshots.path().display(), "loading snapshot");
    let mut state = match snapshots.load() {
        Ok(Some(loaded)) => {
            info!(
                lists = loaded.state.list_count(),
                taken_at = %loaded.taken_at,
                "snapshot loaded"
            );
            report.snapshot_loaded = true;
            report.snapshot_taken_at = Some(loaded.taken_at);
            loaded.state
        }
        Ok(None) => {
            info!("no snapshot found, starting empty");
            ListState::new()
        }
        Err(source) => {
            return Err(RecoveryError::Snapshot {
                path: snapshots.path().to_path_buf(),
                source,
            })
        }
    };

    phase = RecoveryPhase::ReplayingLog;
    info!(%phase, path = %log_path.display(), "replaying log");
    let mut wal = Wal::open(log_path, sync_writes).map_err(|source| RecoveryError::LogOpen {
        path: log_path.to_path_buf(),
        source,
    })?;
    let replay = Wal::replay(log_path).map_err(|source| RecoveryError::LogScan {
        path: log_path.to_path_buf(),
        source,
    })?;

    report.malformed_lines = replay.malformed;
    replay_into(&mut state, &replay.entries, &mut report);

    if let Some(offset) = replay.torn_tail {
        report.torn_tail_bytes = cut_torn_tail(&mut wal, offset)?;
    }

    phase = RecoveryPhase::Serving;
    info!(
        %phase,
        lists = state.list_count(),
        elements = state.element_count(),
        records_applied = report.records_applied,
        malformed_lines = report.malformed_lines,
        skipped_removes = report.skipped_removes,
        "recovery complete"
    );

    Ok(Recovered { state, wal, report })
}

/// Drop the unterminated write at `offset` and return how many bytes went
fn cut_torn_tail(wal: &mut Wal, offset: u64) -> Result<u64, RecoveryError> {
    let path = wal.path().to_path_buf();
    let scan_failed = |source| RecoveryError::LogScan {
        path: path.clone(),
        source,
    };
    let len = wal.len().map_err(scan_failed)?;
    let torn = len.saturating_sub(offset);
    warn!(offset, bytes = torn, "cutting incomplete write from end of log");
    wal.truncate_to(offset).map_err(scan_failed)?;
    Ok(torn)
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
