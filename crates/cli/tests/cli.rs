// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests
//!
//! Each test runs its own daemon in-process on an ephemeral port and drives
//! it through the `rl` binary.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use assert_cmd::Command;
use common::{closed_addr, TestDaemon};
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("rl").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("append"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("snapshot"))
        .stdout(predicate::str::contains("demo"))
        .stdout(predicate::str::contains("--addr"));
}

#[test]
fn test_unreachable_daemon_suggests_starting_it() {
    Command::cargo_bin("rl")
        .unwrap()
        .args(["--addr", &closed_addr(), "ping"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not connect to daemon"))
        .stderr(predicate::str::contains("rld"));
}

#[test]
fn test_addr_from_environment() {
    let daemon = TestDaemon::start();
    Command::cargo_bin("rl")
        .unwrap()
        .env("RL_ADDR", &daemon.addr)
        .arg("ping")
        .assert()
        .success()
        .stdout("pong\n");
}

#[test]
fn test_list_scenario() {
    let daemon = TestDaemon::start();

    for (list, value) in [("A", "10"), ("A", "20"), ("B", "99")] {
        daemon
            .rl()
            .args(["append", list, value])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "Appended {} to {}",
                value, list
            )));
    }

    daemon.rl().args(["size", "A"]).assert().success().stdout("2\n");
    daemon.rl().args(["size", "B"]).assert().success().stdout("1\n");
    daemon.rl().args(["get", "A", "1"]).assert().success().stdout("20\n");
    daemon.rl().args(["remove", "A"]).assert().success().stdout("20\n");
    daemon.rl().args(["size", "A"]).assert().success().stdout("1\n");
}

#[test]
fn test_out_of_range_is_an_error_with_suggestions() {
    let daemon = TestDaemon::start();
    daemon.rl().args(["append", "A", "10"]).assert().success();
    daemon.rl().args(["append", "A", "20"]).assert().success();

    daemon
        .rl()
        .args(["get", "A", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: Index 99 out of range"))
        .stderr(predicate::str::contains("suggestions:"))
        .stderr(predicate::str::contains("from 0 to 1"));
}

#[test]
fn test_unknown_and_empty_lists() {
    let daemon = TestDaemon::start();

    daemon
        .rl()
        .args(["remove", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("List 'ghost' not found"));

    daemon.rl().args(["append", "once", "1"]).assert().success();
    daemon.rl().args(["remove", "once"]).assert().success();
    daemon
        .rl()
        .args(["remove", "once"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("List 'once' is empty"));
    daemon.rl().args(["size", "once"]).assert().success().stdout("0\n");
}

#[test]
fn test_negative_values() {
    let daemon = TestDaemon::start();
    daemon.rl().args(["append", "N", "-5"]).assert().success();
    daemon.rl().args(["get", "N", "0"]).assert().success().stdout("-5\n");
    daemon
        .rl()
        .args(["get", "N", "-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_json_output() {
    let daemon = TestDaemon::start();
    daemon.rl().args(["append", "J", "7"]).assert().success();

    let output = daemon
        .rl()
        .args(["--format", "json", "size", "J"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["size"], 1);
}

#[test]
fn test_demo_runs_scenario() {
    let daemon = TestDaemon::start();
    daemon
        .rl()
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Size of 'lista_A': 2"))
        .stdout(predicate::str::contains("Size of 'lista_B': 1"))
        .stdout(predicate::str::contains("Value at index 1 of 'lista_A': 20"))
        .stdout(predicate::str::contains("Expected error for index 99"))
        .stdout(predicate::str::contains("Removed from 'lista_A': 20"))
        .stdout(predicate::str::contains("New size of 'lista_A': 1"));
}

#[test]
fn test_snapshot_and_status() {
    let daemon = TestDaemon::start();
    daemon.rl().args(["append", "S", "1"]).assert().success();

    daemon
        .rl()
        .arg("snapshot")
        .assert()
        .success()
        .stdout(predicate::str::contains("Snapshot written: 1 lists"));

    daemon
        .rl()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Lists: 1"))
        .stdout(predicate::str::contains("Snapshots taken: 1"))
        .stdout(predicate::str::contains("Log records since snapshot: 0"));

    let log = std::fs::read_to_string(daemon.data_dir().join("log.txt")).unwrap();
    assert!(log.is_empty());
}

#[test]
fn test_state_survives_restart() {
    let daemon = TestDaemon::start();
    daemon.rl().args(["append", "D", "1"]).assert().success();
    daemon.rl().args(["append", "D", "2"]).assert().success();
    daemon.rl().arg("snapshot").assert().success();
    daemon.rl().args(["append", "D", "3"]).assert().success();
    daemon.rl().args(["remove", "D"]).assert().success();
    daemon.rl().args(["append", "D", "4"]).assert().success();

    let dir = daemon.stop();
    let daemon = TestDaemon::start_in(dir);

    daemon.rl().args(["size", "D"]).assert().success().stdout("3\n");
    daemon.rl().args(["get", "D", "2"]).assert().success().stdout("4\n");
}

#[test]
fn test_shutdown_command_stops_daemon() {
    let daemon = TestDaemon::start();
    let addr = daemon.addr.clone();

    daemon
        .rl()
        .arg("shutdown")
        .assert()
        .success()
        .stdout("Daemon shutting down\n");

    let dir = daemon.wait();
    assert!(!dir.path().join("rld.pid").exists());

    Command::cargo_bin("rl")
        .unwrap()
        .args(["--addr", &addr, "ping"])
        .assert()
        .failure();
}
