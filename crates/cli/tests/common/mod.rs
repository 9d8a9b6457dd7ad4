// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use std::thread::JoinHandle;
use std::time::Duration;

use assert_cmd::Command;
use rl_daemon::Config;
use tempfile::TempDir;
use tokio::sync::oneshot;

/// A daemon running in-process on an ephemeral port.
///
/// Stops and waits for a clean shutdown when dropped.
pub struct TestDaemon {
    pub addr: String,
    dir: Option<TempDir>,
    stop: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TestDaemon {
    pub fn start() -> Self {
        Self::start_in(TempDir::new().expect("Failed to create temp directory"))
    }

    /// Start a daemon over an existing data directory
    pub fn start_in(dir: TempDir) -> Self {
        let mut config = Config::for_data_dir(dir.path());
        config.settings.listen_addr = "127.0.0.1:0".to_string();
        config.settings.sync_writes = false;

        let (addr_tx, addr_rx) = std::sync::mpsc::channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
            runtime.block_on(async move {
                let daemon = rl_daemon::startup(&config)
                    .await
                    .expect("Daemon failed to start");
                let addr = daemon.local_addr().expect("Listener has no address");
                addr_tx.send(addr.to_string()).expect("Test went away");
                daemon
                    .run(async {
                        let _ = stop_rx.await;
                    })
                    .await
                    .expect("Daemon failed while running");
            });
        });

        let addr = addr_rx
            .recv_timeout(Duration::from_secs(10))
            .expect("Daemon did not report its address");

        Self {
            addr,
            dir: Some(dir),
            stop: Some(stop_tx),
            thread: Some(thread),
        }
    }

    pub fn data_dir(&self) -> &std::path::Path {
        self.dir.as_ref().expect("Data dir already taken").path()
    }

    /// `rl` pointed at this daemon
    pub fn rl(&self) -> Command {
        let mut cmd = Command::cargo_bin("rl").expect("rl binary not built");
        cmd.env_remove("RL_ADDR").args(["--addr", &self.addr]);
        cmd
    }

    /// Stop the daemon, keeping its data directory
    pub fn stop(mut self) -> TempDir {
        self.shutdown();
        self.dir.take().expect("Data dir already taken")
    }

    /// Wait for the daemon thread to exit on its own, e.g. after `rl shutdown`
    pub fn wait(mut self) -> TempDir {
        if let Some(thread) = self.thread.take() {
            thread.join().expect("Daemon thread panicked");
        }
        self.stop.take();
        self.dir.take().expect("Data dir already taken")
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// An address with nothing listening on it
pub fn closed_addr() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener.local_addr().expect("No local addr").to_string()
}
