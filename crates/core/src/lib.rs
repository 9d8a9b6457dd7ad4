// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rl-core: shared vocabulary for the remotelist store
//!
//! This crate provides:
//! - The log record written for every mutating list operation
//! - The text line codec used by the write-ahead log
//! - The per-call error taxonomy returned by list operations

pub mod error;
pub mod record;

pub use error::ListError;
pub use record::{Record, RecordError};
