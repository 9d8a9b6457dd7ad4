// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon commands: status, snapshot, ping, shutdown

use std::fmt;

use serde::Serialize;

use crate::client::{ClientError, DaemonClient};
use crate::output::{self, OutputFormat};

#[derive(Debug, Serialize)]
struct Status {
    addr: String,
    uptime_secs: u64,
    lists: usize,
    elements: usize,
    records_since_snapshot: u64,
    snapshots_taken: u64,
    last_snapshot: Option<String>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Daemon at {}", self.addr)?;
        writeln!(f, "  Uptime: {}s", self.uptime_secs)?;
        writeln!(f, "  Lists: {}", self.lists)?;
        writeln!(f, "  Elements: {}", self.elements)?;
        writeln!(f, "  Log records since snapshot: {}", self.records_since_snapshot)?;
        writeln!(f, "  Snapshots taken: {}", self.snapshots_taken)?;
        write!(
            f,
            "  Last snapshot: {}",
            self.last_snapshot.as_deref().unwrap_or("never")
        )
    }
}

#[derive(Debug, Serialize)]
struct SnapshotTaken {
    lists: usize,
    bytes: u64,
}

impl fmt::Display for SnapshotTaken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Snapshot written: {} lists, {} bytes",
            self.lists, self.bytes
        )
    }
}

pub async fn status(client: &mut DaemonClient, format: OutputFormat) -> Result<(), ClientError> {
    let status = client.status().await?;
    let status = Status {
        addr: client.addr().to_string(),
        uptime_secs: status.uptime_secs,
        lists: status.lists,
        elements: status.elements,
        records_since_snapshot: status.records_since_snapshot,
        snapshots_taken: status.snapshots_taken,
        last_snapshot: status.last_snapshot,
    };
    output::print(&status, format);
    Ok(())
}

pub async fn snapshot(client: &mut DaemonClient, format: OutputFormat) -> Result<(), ClientError> {
    let (lists, bytes) = client.snapshot().await?;
    output::print(&SnapshotTaken { lists, bytes }, format);
    Ok(())
}

pub async fn ping(client: &mut DaemonClient) -> Result<(), ClientError> {
    client.ping().await?;
    println!("pong");
    Ok(())
}

pub async fn shutdown(client: &mut DaemonClient) -> Result<(), ClientError> {
    client.shutdown().await?;
    println!("Daemon shutting down");
    Ok(())
}
