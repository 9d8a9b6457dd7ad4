// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rl-daemon: the remotelist server
//!
//! Owns the data directory, recovers the store on startup, serves list
//! operations over TCP, and snapshots in the background.

pub mod config;
pub mod lifecycle;
pub mod protocol;
pub mod server;
pub mod snapshotter;

pub use config::{Config, ConfigError};
pub use lifecycle::{startup, DaemonState, LifecycleError};
pub use protocol::{Request, Response};
