// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.
//!
//! This module provides enhanced error types that include:
//! - What went wrong (message)
//! - Why it might have happened (context)
//! - How to fix it (suggestions)

use std::fmt;

use rl_core::ListError;

use crate::client::ClientError;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct RlError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RlError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    /// Add context about why this error might have happened.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    /// Add a suggestion for how to fix this error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Set the source error that caused this error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for RlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for RlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Common error builders for typical failure scenarios.
impl RlError {
    /// Error for when nothing is listening at the daemon address.
    pub fn daemon_unreachable(addr: &str) -> Self {
        RlError::new(format!("Could not connect to daemon at {}", addr))
            .with_context("The daemon may not be running, or is listening elsewhere")
            .with_suggestion("Start the daemon: rld <data-dir>")
            .with_suggestion("Point at another address: rl --addr <host:port> ...")
    }

    /// Error for list operations the store refused.
    pub fn list(error: &ListError) -> Self {
        match error {
            ListError::NotFound { list_id } => {
                RlError::new(format!("List '{}' not found", list_id))
                    .with_context("Lists are created by their first append")
                    .with_suggestion(format!("Create it: rl append {} <value>", list_id))
            }
            ListError::EmptyCollection { list_id } => {
                RlError::new(format!("List '{}' is empty", list_id))
                    .with_context("Every value has already been removed")
                    .with_suggestion(format!("Check its size: rl size {}", list_id))
            }
            ListError::OutOfRange {
                list_id,
                index,
                size,
            } => RlError::new(format!("Index {} out of range for list '{}'", index, list_id))
                .with_context(format!("The list has {} values", size))
                .with_suggestion(if *size == 0 {
                    format!("Append to it first: rl append {} <value>", list_id)
                } else {
                    format!("Use an index from 0 to {}", size - 1)
                }),
        }
    }

    /// Error for when the daemon did not answer in time.
    pub fn timeout(addr: &str) -> Self {
        RlError::new(format!("Timed out talking to daemon at {}", addr))
            .with_context("The daemon may be overloaded or stuck on disk IO")
            .with_suggestion("Raise the timeout: RL_TIMEOUT_IPC_MS=<ms> rl ...")
            .with_suggestion("Check the daemon log: <data-dir>/rld.log")
    }

    pub fn from_client(error: ClientError, addr: &str) -> Self {
        match error {
            ClientError::DaemonNotRunning { source, .. } => {
                RlError::daemon_unreachable(addr).with_source(source)
            }
            ClientError::Timeout => RlError::timeout(addr),
            ClientError::List(e) => RlError::list(&e),
            other => RlError::new(other.to_string()).with_source(other),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
