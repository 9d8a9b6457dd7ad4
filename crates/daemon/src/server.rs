// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP server and connection handling.

use std::sync::Arc;
use std::time::Instant;

use rl_storage::{DurableStore, StoreError};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, IDLE_TIMEOUT};

/// State shared by every connection task
pub struct ServerContext {
    pub store: Arc<DurableStore>,
    /// When the daemon started serving
    pub start_time: Instant,
    shutdown_tx: watch::Sender<bool>,
}

impl ServerContext {
    pub fn new(store: Arc<DurableStore>, shutdown_tx: watch::Sender<bool>) -> Self {
        Self {
            store,
            start_time: Instant::now(),
            shutdown_tx,
        }
    }

    /// Ask the accept loop, the scheduler, and the daemon to stop
    pub fn request_shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }
}

/// Accept connections until shutdown is requested
///
/// Each connection gets its own task; a failing connection is logged and
/// does not affect the others.
pub async fn serve(listener: TcpListener, ctx: Arc<ServerContext>) {
    let mut shutdown = ctx.subscribe();

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted connection");
                        let ctx = Arc::clone(&ctx);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(&ctx, stream).await {
                                error!(%peer, "Error handling connection: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                    }
                }
            }

            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!("listener closed");
}

/// Serve requests on one connection until the client goes away
pub async fn handle_connection(ctx: &ServerContext, stream: TcpStream) -> Result<(), ServerError> {
    // Split stream for reading/writing
    let (mut reader, mut writer) = stream.into_split();

    loop {
        let request = match protocol::read_request(&mut reader, IDLE_TIMEOUT).await {
            Ok(req) => req,
            Err(protocol::ProtocolError::Timeout) => {
                debug!("Closing idle connection");
                return Ok(());
            }
            Err(protocol::ProtocolError::ConnectionClosed) => {
                debug!("Client disconnected");
                return Ok(());
            }
            Err(e) => {
                warn!("Failed to read request: {}", e);
                return Err(ServerError::Protocol(e));
            }
        };

        debug!("Received request: {:?}", request);

        let stop_after = matches!(request, Request::Shutdown);
        let response = handle_request(ctx, request).await;

        debug!("Sending response: {:?}", response);

        protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
            .await
            .map_err(ServerError::Protocol)?;

        if stop_after {
            return Ok(());
        }
    }
}

/// Handle a single request and return a response
async fn handle_request(ctx: &ServerContext, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Append { list_id, value } => {
            if let Err(response) = validate_list_id(&list_id) {
                return response;
            }
            with_store(ctx, move |store| store.append(&list_id, value))
                .await
                .map_or_else(|r| r, |()| Response::Appended { ok: true })
        }

        Request::Remove { list_id } => {
            if let Err(response) = validate_list_id(&list_id) {
                return response;
            }
            with_store(ctx, move |store| store.remove(&list_id))
                .await
                .map_or_else(|r| r, |value| Response::Value { value })
        }

        Request::Get { list_id, index } => {
            with_store(ctx, move |store| store.get(&list_id, index))
                .await
                .map_or_else(|r| r, |value| Response::Value { value })
        }

        Request::Size { list_id } => with_store(ctx, move |store| store.size(&list_id))
            .await
            .map_or_else(|r| r, |count| Response::Size { count }),

        Request::Status => with_store(ctx, |store| Ok(store.stats()))
            .await
            .map_or_else(
                |r| r,
                |stats| Response::Status {
                    uptime_secs: ctx.start_time.elapsed().as_secs(),
                    lists: stats.lists,
                    elements: stats.elements,
                    records_since_snapshot: stats.records_since_snapshot,
                    snapshots_taken: stats.snapshots_taken,
                    last_snapshot: stats.last_snapshot,
                },
            ),

        Request::Snapshot => with_store(ctx, |store| store.snapshot())
            .await
            .map_or_else(
                |r| r,
                |stats| {
                    info!(
                        lists = stats.lists,
                        bytes = stats.bytes,
                        "snapshot taken on request"
                    );
                    Response::SnapshotTaken {
                        lists: stats.lists,
                        bytes: stats.bytes,
                    }
                },
            ),

        Request::Shutdown => {
            ctx.request_shutdown();
            Response::ShuttingDown
        }
    }
}

/// Ids containing a line break could not be written as a single log line
fn validate_list_id(list_id: &str) -> Result<(), Response> {
    if list_id.contains(['\n', '\r']) {
        return Err(Response::Error {
            message: format!("invalid list id {:?}: must not contain line breaks", list_id),
        });
    }
    Ok(())
}

/// Run a store call on the blocking pool and map failures to responses
async fn with_store<T, F>(ctx: &ServerContext, f: F) -> Result<T, Response>
where
    T: Send + 'static,
    F: FnOnce(&DurableStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(&ctx.store);
    match tokio::task::spawn_blocking(move || f(&store)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(StoreError::List(error))) => Err(Response::ListError { error }),
        Ok(Err(e)) => {
            error!("Store operation failed: {}", e);
            Err(Response::Error {
                message: e.to_string(),
            })
        }
        Err(e) => {
            error!("Store task failed: {}", e);
            Err(Response::Error {
                message: format!("internal error: {}", e),
            })
        }
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
