// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for durable storage
//!
//! The log is plain text, one [`Record`] per line. Every write repositions
//! to end-of-file first, because the snapshot cycle truncates the file out
//! from under the writer.

use rl_core::Record;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Write-ahead log for durable list operations
pub struct Wal {
    path: PathBuf,
    file: File,
    sync_writes: bool,
}

impl Wal {
    /// Open or create a WAL at the given path, positioned at end-of-file
    pub fn open(path: &Path, sync_writes: bool) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Not O_APPEND: the snapshot cycle truncates and rewinds this handle.
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;
        file.seek(SeekFrom::End(0))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sync_writes,
        })
    }

    /// Append a record to the log
    ///
    /// Returns the file length after the write. When the write fails part
    /// way, the file is cut back to its previous length so that a fragment
    /// never prefixes the next record.
    pub fn append(&mut self, record: &Record) -> Result<u64, WalError> {
        let start = self.file.seek(SeekFrom::End(0))?;

        let mut line = record.to_line();
        line.push('\n');

        if let Err(e) = self.write_line(line.as_bytes()) {
            if let Err(rollback) = self.file.set_len(start) {
                warn!(
                    path = %self.path.display(),
                    error = %rollback,
                    "failed to roll back partial log write"
                );
            }
            return Err(e.into());
        }

        Ok(start + line.len() as u64)
    }

    fn write_line(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        if self.sync_writes {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Truncate the log to zero length and rewind to the start
    pub fn reset(&mut self) -> Result<(), WalError> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// Cut the log back to `len` bytes
    pub fn truncate_to(&mut self, len: u64) -> Result<(), WalError> {
        self.file.set_len(len)?;
        self.file.sync_all()?;
        self.file.seek(SeekFrom::End(0))?;
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<(), WalError> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Current length of the log file in bytes
    pub fn len(&self) -> Result<u64, WalError> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, WalError> {
        Ok(self.len()? == 0)
    }

    /// Get the path to the WAL file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record from the log, in file order
    ///
    /// Malformed lines are skipped with a warning. A missing file is an
    /// empty log. Any IO error while scanning is returned to the caller.
    pub fn replay(path: &Path) -> Result<Replay, WalError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Replay::default()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = BufReader::new(file);
        let mut replay = Replay::default();
        let mut buf = Vec::new();
        let mut line_number = 0u64;
        let mut offset = 0u64;

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }
            line_number += 1;
            let line_start = offset;
            offset += read as u64;

            // A final line without its newline is a write that never completed.
            if buf.last() != Some(&b'\n') {
                warn!(
                    line = line_number,
                    bytes = read,
                    "ignoring incomplete final log line"
                );
                replay.torn_tail = Some(line_start);
                break;
            }

            let Ok(text) = std::str::from_utf8(&buf) else {
                warn!(line = line_number, "ignoring log line that is not valid UTF-8");
                replay.malformed += 1;
                continue;
            };

            if text.trim_end_matches(['\r', '\n']).is_empty() {
                continue;
            }

            match Record::parse_line(text) {
                Ok(record) => replay.entries.push(LogEntry {
                    line: line_number,
                    record,
                }),
                Err(e) => {
                    warn!(
                        line = line_number,
                        error = %e,
                        content = %text.trim_end(),
                        "ignoring malformed log line"
                    );
                    replay.malformed += 1;
                }
            }
        }

        Ok(replay)
    }
}

/// A record read back from the log, with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub line: u64,
    pub record: Record,
}

/// Result of scanning a log file
#[derive(Debug, Default)]
pub struct Replay {
    /// Well-formed records in file order
    pub entries: Vec<LogEntry>,
    /// Lines that were skipped because they could not be parsed
    pub malformed: u64,
    /// Byte offset of a trailing line that was cut short, if any
    pub torn_tail: Option<u64>,
}

impl Replay {
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|e| &e.record)
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
