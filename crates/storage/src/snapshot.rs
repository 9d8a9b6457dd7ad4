// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot management for WAL truncation
//!
//! A snapshot is a full copy of the list state. Once it is written the log
//! can be truncated, and recovery starts from the snapshot instead of an
//! ever-growing log.
//!
//! ## File layout
//!
//! ```text
//! magic "RLSNAP" (6) | version u16 | payload len u64 | payload | crc32 u32
//! ```
//!
//! Integers are little-endian. The payload is bincode and the CRC covers
//! every byte before it. Writes go to a temp file that is renamed into
//! place, so a crash mid-write never leaves a half-written snapshot.

use crate::state::ListState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const MAGIC: &[u8; 6] = b"RLSNAP";
const HEADER_LEN: usize = MAGIC.len() + 2 + 8;
const CRC_LEN: usize = 4;

/// Current version of the snapshot format
pub const SNAPSHOT_VERSION: u16 = 1;

/// Errors that can occur during snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot too short: {actual} bytes")]
    TooShort { actual: usize },
    #[error("not a snapshot file (bad magic)")]
    BadMagic,
    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u16),
    #[error("payload length mismatch: header says {declared}, file has {actual}")]
    LengthMismatch { declared: u64, actual: u64 },
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] bincode::Error),
    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] bincode::Error),
}

#[derive(Serialize)]
struct SnapshotBodyRef<'a> {
    taken_at: DateTime<Utc>,
    lists: &'a BTreeMap<String, Vec<i64>>,
}

#[derive(Deserialize)]
struct SnapshotBody {
    taken_at: DateTime<Utc>,
    lists: BTreeMap<String, Vec<i64>>,
}

/// A snapshot read back from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSnapshot {
    pub state: ListState,
    pub taken_at: DateTime<Utc>,
}

/// Metadata about a snapshot that was just written
#[derive(Debug, Clone)]
pub struct SnapshotMeta {
    pub taken_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub lists: usize,
    pub elements: usize,
}

/// Encode a state into the snapshot file format
pub fn encode(state: &ListState, taken_at: DateTime<Utc>) -> Result<Vec<u8>, SnapshotError> {
    let body = SnapshotBodyRef {
        taken_at,
        lists: state.lists(),
    };
    let payload = bincode::serialize(&body).map_err(SnapshotError::Encode)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len() + CRC_LEN);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&payload);

    let crc = crc32fast::hash(&bytes);
    bytes.extend_from_slice(&crc.to_le_bytes());
    Ok(bytes)
}

/// Decode and validate a snapshot file's contents
pub fn decode(bytes: &[u8]) -> Result<LoadedSnapshot, SnapshotError> {
    if bytes.len() < HEADER_LEN + CRC_LEN {
        return Err(SnapshotError::TooShort {
            actual: bytes.len(),
        });
    }
    if &bytes[..MAGIC.len()] != MAGIC {
        return Err(SnapshotError::BadMagic);
    }

    let (content, crc_bytes) = bytes.split_at(bytes.len() - CRC_LEN);
    let stored = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    let computed = crc32fast::hash(content);
    if stored != computed {
        return Err(SnapshotError::ChecksumMismatch { stored, computed });
    }

    let version = u16::from_le_bytes([content[6], content[7]]);
    if version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(version));
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&content[8..HEADER_LEN]);
    let declared = u64::from_le_bytes(len_bytes);
    let payload = &content[HEADER_LEN..];
    if declared != payload.len() as u64 {
        return Err(SnapshotError::LengthMismatch {
            declared,
            actual: payload.len() as u64,
        });
    }

    let body: SnapshotBody = bincode::deserialize(payload).map_err(SnapshotError::Decode)?;
    Ok(LoadedSnapshot {
        state: ListState::from_lists(body.lists),
        taken_at: body.taken_at,
    })
}

/// Reads and atomically replaces the snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    path: PathBuf,
}

impl SnapshotManager {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write a snapshot of `state`, replacing the previous one
    ///
    /// The bytes go to a temp file which is synced and then renamed over
    /// the snapshot path. On failure the temp file is removed and the old
    /// snapshot is left as it was.
    pub fn save(&self, state: &ListState) -> Result<SnapshotMeta, SnapshotError> {
        let taken_at = Utc::now();
        let bytes = encode(state, taken_at)?;
        let temp_path = self.temp_path();

        // Clean up stale temp file if exists (from previous failed attempt)
        if temp_path.exists() {
            match fs::remove_file(&temp_path) {
                Ok(()) => {
                    warn!(path = %temp_path.display(), "removed stale snapshot temp file")
                }
                Err(e) => warn!(
                    path = %temp_path.display(),
                    error = %e,
                    "failed to remove stale snapshot temp file"
                ),
            }
        }

        let result =
            write_synced(&temp_path, &bytes).and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = result {
            warn!(
                temp_path = %temp_path.display(),
                error = %e,
                "snapshot write failed, cleaning up temp file"
            );
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        sync_parent_dir(&self.path);

        debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot written");

        Ok(SnapshotMeta {
            taken_at,
            size_bytes: bytes.len() as u64,
            lists: state.list_count(),
            elements: state.element_count(),
        })
    }

    /// Load the snapshot, or `None` if none has been written yet
    pub fn load(&self) -> Result<Option<LoadedSnapshot>, SnapshotError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        decode(&bytes).map(Some)
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

// Makes the rename itself durable. Not every platform can open a
// directory, so failures are ignored.
fn sync_parent_dir(path: &Path) {
    let Some(parent) = path.parent() else {
        return;
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
