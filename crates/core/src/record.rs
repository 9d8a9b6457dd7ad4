// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log records for the write-ahead log
//!
//! Each mutating list operation is persisted as one comma-separated text
//! line:
//!
//! ```text
//! APPEND,<list_id>,<value>
//! REMOVE,<list_id>
//! ```
//!
//! The value of an `APPEND` is taken from the last comma, so list ids that
//! contain commas survive a write/parse cycle.

use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;

const APPEND_TAG: &str = "APPEND";
const REMOVE_TAG: &str = "REMOVE";

/// Why a log line could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("missing ',' separator")]
    MissingSeparator,
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
    #[error("APPEND without a value")]
    MissingValue,
    #[error("invalid value {value:?}: {source}")]
    InvalidValue {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// A mutating operation as it is persisted in the log
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Record {
    /// Push `value` onto the tail of `list_id`, creating the list if needed
    Append { list_id: String, value: i64 },
    /// Pop the tail of `list_id`
    Remove { list_id: String },
}

impl Record {
    pub fn append(list_id: impl Into<String>, value: i64) -> Self {
        Record::Append {
            list_id: list_id.into(),
            value,
        }
    }

    pub fn remove(list_id: impl Into<String>) -> Self {
        Record::Remove {
            list_id: list_id.into(),
        }
    }

    /// The list this record mutates
    pub fn list_id(&self) -> &str {
        match self {
            Record::Append { list_id, .. } | Record::Remove { list_id } => list_id,
        }
    }

    /// Encode as a single log line, without the trailing newline
    pub fn to_line(&self) -> String {
        self.to_string()
    }

    /// Parse a single log line.
    ///
    /// A trailing `\n` or `\r\n` is ignored.
    pub fn parse_line(line: &str) -> Result<Self, RecordError> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        let (tag, rest) = line
            .split_once(',')
            .ok_or(RecordError::MissingSeparator)?;

        match tag {
            APPEND_TAG => {
                let (list_id, value) = rest.rsplit_once(',').ok_or(RecordError::MissingValue)?;
                let value = value
                    .parse::<i64>()
                    .map_err(|source| RecordError::InvalidValue {
                        value: value.to_string(),
                        source,
                    })?;
                Ok(Record::append(list_id, value))
            }
            REMOVE_TAG => Ok(Record::remove(rest)),
            other => Err(RecordError::UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Append { list_id, value } => write!(f, "{},{},{}", APPEND_TAG, list_id, value),
            Record::Remove { list_id } => write!(f, "{},{}", REMOVE_TAG, list_id),
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
