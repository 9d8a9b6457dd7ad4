// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rl-storage: durable storage for the remotelist store
//!
//! This crate provides:
//! - The in-memory list state
//! - A text write-ahead log with torn-tail detection
//! - Checksummed binary snapshots, replaced atomically
//! - Startup recovery and the lock-guarded [`DurableStore`]

pub mod recovery;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod wal;

pub use recovery::{recover, Recovered, RecoveryError, RecoveryPhase, RecoveryReport};
pub use snapshot::{SnapshotError, SnapshotManager, SnapshotMeta};
pub use state::ListState;
pub use store::{
    DurableStore, SnapshotStats, StoreConfig, StoreError, StoreStats, LOG_FILE, SNAPSHOT_FILE,
};
pub use wal::{LogEntry, Replay, Wal, WalError};
