// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use rl_core::{ListError, Record};

struct Dirs {
    _dir: tempfile::TempDir,
    snapshots: SnapshotManager,
    log_path: PathBuf,
}

fn dirs() -> Dirs {
    let dir = tempfile::tempdir().unwrap();
    let snapshots = SnapshotManager::new(&dir.path().join("snapshot.dat"));
    let log_path = dir.path().join("log.txt");
    Dirs {
        _dir: dir,
        snapshots,
        log_path,
    }
}

#[test]
fn first_run_starts_empty_and_creates_log() {
    let d = dirs();
    let recovered = recover(&d.snapshots, &d.log_path, true).unwrap();

    assert!(recovered.state.is_empty());
    assert!(!recovered.report.snapshot_loaded);
    assert!(d.log_path.exists());
}

#[test]
fn log_only_replay() {
    let d = dirs();
    std::fs::write(
        &d.log_path,
        "APPEND,A,10\nAPPEND,A,20\nAPPEND,B,99\nREMOVE,A\n",
    )
    .unwrap();

    let recovered = recover(&d.snapshots, &d.log_path, true).unwrap();
    assert_eq!(recovered.state.size("A"), Ok(1));
    assert_eq!(recovered.state.get("A", 0), Ok(10));
    assert_eq!(recovered.state.size("B"), Ok(1));
    assert_eq!(recovered.report.records_applied, 4);
}

#[test]
fn snapshot_then_log() {
    let d = dirs();
    let mut base = ListState::new();
    base.append("A", 1);
    base.append("A", 2);
    d.snapshots.save(&base).unwrap();
    std::fs::write(&d.log_path, "REMOVE,A\nAPPEND,C,7\n").unwrap();

    let recovered = recover(&d.snapshots, &d.log_path, true).unwrap();
    assert!(recovered.report.snapshot_loaded);
    assert_eq!(recovered.state.get("A", 0), Ok(1));
    assert_eq!(recovered.state.size("A"), Ok(1));
    assert_eq!(recovered.state.get("C", 0), Ok(7));
}

#[test]
fn impossible_removes_are_skipped() {
    let d = dirs();
    std::fs::write(
        &d.log_path,
        "REMOVE,ghost\nAPPEND,A,1\nREMOVE,A\nREMOVE,A\nAPPEND,A,2\n",
    )
    .unwrap();

    let recovered = recover(&d.snapshots, &d.log_path, true).unwrap();
    assert_eq!(recovered.report.skipped_removes, 2);
    assert_eq!(recovered.report.records_applied, 3);
    assert_eq!(recovered.state.get("A", 0), Ok(2));
    assert_eq!(recovered.state.size("ghost"), Err(ListError::not_found("ghost")));
}

#[test]
fn malformed_lines_never_fail_recovery() {
    let d = dirs();
    std::fs::write(&d.log_path, "APPEND,A,1\n???\nAPPEND,A,x\nAPPEND,A,2\n").unwrap();

    let recovered = recover(&d.snapshots, &d.log_path, true).unwrap();
    assert_eq!(recovered.report.malformed_lines, 2);
    assert_eq!(recovered.state.size("A"), Ok(2));
}

#[test]
fn corrupt_snapshot_is_fatal() {
    let d = dirs();
    std::fs::write(d.snapshots.path(), b"definitely not a snapshot file").unwrap();

    let err = match recover(&d.snapshots, &d.log_path, true) {
        Err(e) => e,
        Ok(_) => panic!("expected recovery to fail"),
    };
    assert!(matches!(err, RecoveryError::Snapshot { .. }));
    assert_eq!(err.phase(), RecoveryPhase::LoadingSnapshot);
}

#[test]
fn unreadable_log_is_fatal() {
    let d = dirs();
    // A directory cannot be opened for writing as the log
    std::fs::create_dir(&d.log_path).unwrap();

    let err = match recover(&d.snapshots, &d.log_path, true) {
        Err(e) => e,
        Ok(_) => panic!("expected recovery to fail"),
    };
    assert_eq!(err.phase(), RecoveryPhase::ReplayingLog);
}

#[test]
fn torn_tail_is_cut_before_serving() {
    let d = dirs();
    std::fs::write(&d.log_path, "APPEND,A,1\nAPPEND,A,2").unwrap();

    let mut recovered = recover(&d.snapshots, &d.log_path, true).unwrap();
    assert_eq!(recovered.state.size("A"), Ok(1));
    assert_eq!(recovered.report.torn_tail_bytes, "APPEND,A,2".len() as u64);

    // New writes land after the last complete record
    recovered.wal.append(&Record::append("A", 3)).unwrap();
    assert_eq!(
        std::fs::read_to_string(&d.log_path).unwrap(),
        "APPEND,A,1\nAPPEND,A,3\n"
    );
}

// /dev/full cannot be truncated, so cutting the tail fails
#[cfg(target_os = "linux")]
#[test]
fn failing_to_cut_torn_tail_is_a_scan_error() {
    let mut wal = Wal::open(Path::new("/dev/full"), false).unwrap();

    let err = match cut_torn_tail(&mut wal, 0) {
        Err(e) => e,
        Ok(_) => panic!("expected truncation to fail"),
    };
    assert!(matches!(err, RecoveryError::LogScan { .. }));
    assert_eq!(err.phase(), RecoveryPhase::ReplayingLog);
    assert!(err.to_string().starts_with("failed to scan log /dev/full"));
}

#[test]
fn recovered_wal_extends_existing_log() {
    let d = dirs();
    std::fs::write(&d.log_path, "APPEND,A,1\n").unwrap();

    let mut recovered = recover(&d.snapshots, &d.log_path, true).unwrap();
    recovered.wal.append(&Record::append("A", 2)).unwrap();

    assert_eq!(
        std::fs::read_to_string(&d.log_path).unwrap(),
        "APPEND,A,1\nAPPEND,A,2\n"
    );
}

#[test]
fn phase_names() {
    assert_eq!(RecoveryPhase::Init.to_string(), "INIT");
    assert_eq!(RecoveryPhase::LoadingSnapshot.to_string(), "LOADING_SNAPSHOT");
    assert_eq!(RecoveryPhase::ReplayingLog.to_string(), "REPLAYING_LOG");
    assert_eq!(RecoveryPhase::Serving.to_string(), "SERVING");
}

fn record_strategy() -> impl Strategy<Value = Record> {
    prop_oneof![
        ("[ab]", -5i64..5).prop_map(|(l, v)| Record::append(l, v)),
        "[ab]".prop_map(Record::remove),
    ]
}

proptest! {
    #[test]
    fn replay_matches_direct_application(
        base in proptest::collection::vec(record_strategy(), 0..16),
        log in proptest::collection::vec(record_strategy(), 0..32),
    ) {
        let d = dirs();

        // Build the snapshot state from `base`
        let mut snapshot_state = ListState::new();
        for record in &base {
            let _ = snapshot_state.apply(record);
        }
        d.snapshots.save(&snapshot_state).unwrap();

        // Apply the log directly
        let mut expected = snapshot_state.clone();
        for record in &log {
            let _ = expected.apply(record);
        }

        // Write the log and recover from disk
        {
            let mut wal = Wal::open(&d.log_path, false).unwrap();
            for record in &log {
                wal.append(record).unwrap();
            }
        }
        let recovered = recover(&d.snapshots, &d.log_path, false).unwrap();
        prop_assert_eq!(recovered.state, expected);
    }
}
