// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::time::Duration;

use rl_core::ListError;
use rl_daemon::protocol::{self, ProtocolError};
use rl_daemon::{Request, Response};
use thiserror::Error;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Address used when neither `--addr` nor `RL_ADDR` is given
pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for connecting and for each request/response exchange
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("RL_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not reachable at {addr}: {source}")]
    DaemonNotRunning {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out talking to daemon")]
    Timeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The daemon accepted the request but the list refused it
    #[error("{0}")]
    List(ListError),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,
}

/// Daemon status as reported by `Status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub lists: usize,
    pub elements: usize,
    pub records_since_snapshot: u64,
    pub snapshots_taken: u64,
    pub last_snapshot: Option<String>,
}

/// One open connection to the daemon
///
/// Requests are sent in order over the same connection.
pub struct DaemonClient {
    addr: String,
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    timeout: Duration,
}

impl DaemonClient {
    /// Connect to a running daemon (no auto-start)
    pub async fn connect(addr: &str) -> Result<Self, ClientError> {
        let timeout = timeout_ipc();
        let stream = match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ClientError::DaemonNotRunning {
                    addr: addr.to_string(),
                    source,
                })
            }
            Err(_) => return Err(ClientError::Timeout),
        };
        let (reader, writer) = stream.into_split();

        Ok(Self {
            addr: addr.to_string(),
            reader,
            writer,
            timeout,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send a request and receive a response
    pub async fn send(&mut self, request: Request) -> Result<Response, ClientError> {
        // Encode and send request with write timeout
        let data = protocol::encode(&request)?;
        tokio::time::timeout(self.timeout, protocol::write_message(&mut self.writer, &data))
            .await
            .map_err(|_| ClientError::Timeout)??;

        // Read response with read timeout
        let response_bytes =
            tokio::time::timeout(self.timeout, protocol::read_message(&mut self.reader))
                .await
                .map_err(|_| ClientError::Timeout)??;

        let response: Response = protocol::decode(&response_bytes)?;
        Ok(response)
    }

    pub async fn ping(&mut self) -> Result<(), ClientError> {
        match self.send(Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn append(&mut self, list_id: &str, value: i64) -> Result<(), ClientError> {
        let request = Request::Append {
            list_id: list_id.to_string(),
            value,
        };
        match self.send(request).await? {
            Response::Appended { ok: true } => Ok(()),
            Response::Appended { ok: false } => {
                Err(ClientError::Rejected("append not acknowledged".to_string()))
            }
            other => Err(unexpected(other)),
        }
    }

    pub async fn remove(&mut self, list_id: &str) -> Result<i64, ClientError> {
        let request = Request::Remove {
            list_id: list_id.to_string(),
        };
        match self.send(request).await? {
            Response::Value { value } => Ok(value),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get(&mut self, list_id: &str, index: i64) -> Result<i64, ClientError> {
        let request = Request::Get {
            list_id: list_id.to_string(),
            index,
        };
        match self.send(request).await? {
            Response::Value { value } => Ok(value),
            other => Err(unexpected(other)),
        }
    }

    pub async fn size(&mut self, list_id: &str) -> Result<usize, ClientError> {
        let request = Request::Size {
            list_id: list_id.to_string(),
        };
        match self.send(request).await? {
            Response::Size { count } => Ok(count),
            other => Err(unexpected(other)),
        }
    }

    /// Get daemon status
    pub async fn status(&mut self) -> Result<DaemonStatus, ClientError> {
        match self.send(Request::Status).await? {
            Response::Status {
                uptime_secs,
                lists,
                elements,
                records_since_snapshot,
                snapshots_taken,
                last_snapshot,
            } => Ok(DaemonStatus {
                uptime_secs,
                lists,
                elements,
                records_since_snapshot,
                snapshots_taken,
                last_snapshot: last_snapshot.map(|t| t.to_rfc3339()),
            }),
            other => Err(unexpected(other)),
        }
    }

    /// Force a snapshot cycle, returning (lists, bytes)
    pub async fn snapshot(&mut self) -> Result<(usize, u64), ClientError> {
        match self.send(Request::Snapshot).await? {
            Response::SnapshotTaken { lists, bytes } => Ok((lists, bytes)),
            other => Err(unexpected(other)),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&mut self) -> Result<(), ClientError> {
        match self.send(Request::Shutdown).await? {
            Response::ShuttingDown => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: Response) -> ClientError {
    match response {
        Response::ListError { error } => ClientError::List(error),
        Response::Error { message } => ClientError::Rejected(message),
        _ => ClientError::UnexpectedResponse,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
