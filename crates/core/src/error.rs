// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recoverable errors returned by individual list operations

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Expected, per-call failures of list operations.
///
/// These never escape the call that produced them and are safe to send
/// back to a remote caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListError {
    #[error("list not found: {list_id}")]
    NotFound { list_id: String },

    #[error("list is empty: {list_id}")]
    EmptyCollection { list_id: String },

    #[error("index {index} out of range for list {list_id} (size {size})")]
    OutOfRange {
        list_id: String,
        index: i64,
        size: usize,
    },
}

impl ListError {
    pub fn not_found(list_id: &str) -> Self {
        ListError::NotFound {
            list_id: list_id.to_string(),
        }
    }

    pub fn empty(list_id: &str) -> Self {
        ListError::EmptyCollection {
            list_id: list_id.to_string(),
        }
    }

    pub fn out_of_range(list_id: &str, index: i64, size: usize) -> Self {
        ListError::OutOfRange {
            list_id: list_id.to_string(),
            index,
            size,
        }
    }

    /// The list the failed call targeted
    pub fn list_id(&self) -> &str {
        match self {
            ListError::NotFound { list_id }
            | ListError::EmptyCollection { list_id }
            | ListError::OutOfRange { list_id, .. } => list_id,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
