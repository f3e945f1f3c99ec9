// =====================================================================
// File: persistence/tests.rs
//
// Description:
//   Unit tests for the append-only log, the snapshot file, and the
//   snapshot timer. Each test writes into its own temp directory.
// =====================================================================

use std::time::Duration;

use tempfile::tempdir;

use crate::persistence::{AofLog, Snapshot, SnapshotTimer};
use crate::store::Keyspace;

// =====================================================================
// Append-only log
// =====================================================================

#[test]
fn append_then_replay_preserves_order() {
    let dir = tempdir().unwrap();
    let log = AofLog::new(dir.path().join("aof.log"));

    log.append("SET dog bark").unwrap();
    log.append("SET cat meow").unwrap();
    log.append("DEL dog").unwrap();

    let records = log.replay().unwrap();
    assert_eq!(records, vec!["SET dog bark", "SET cat meow", "DEL dog"]);
}

#[test]
fn replay_of_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let log = AofLog::new(dir.path().join("never_written.log"));
    assert!(log.replay().unwrap().is_empty());
}

#[test]
fn replay_skips_blank_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("aof.log");
    std::fs::write(&path, "SET a 1\n\n   \nSET b 2\n").unwrap();

    let log = AofLog::new(path);
    assert_eq!(log.replay().unwrap(), vec!["SET a 1", "SET b 2"]);
}

#[test]
fn appends_survive_reopening_the_handle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("aof.log");

    AofLog::new(&path).append("SET one 1").unwrap();
    AofLog::new(&path).append("SET two 2").unwrap();

    let records = AofLog::new(&path).replay().unwrap();
    assert_eq!(records.len(), 2);
}

// =====================================================================
// Snapshot
// =====================================================================

#[test]
fn snapshot_round_trips_string_entries() {
    let dir = tempdir().unwrap();
    let snapshot = Snapshot::new(dir.path().join("snap.txt"));

    let mut ks = Keyspace::new();
    ks.set("dog".into(), "bark".into(), None);
    ks.set("phrase".into(), "hello world".into(), None);

    let written = snapshot.save(&ks).unwrap();
    assert_eq!(written, 2);

    let mut entries = snapshot.load().unwrap();
    entries.sort();
    assert_eq!(
        entries,
        vec![
            ("dog".to_string(), "bark".to_string()),
            ("phrase".to_string(), "hello world".to_string()),
        ]
    );
}

#[test]
fn snapshot_omits_list_entries() {
    let dir = tempdir().unwrap();
    let snapshot = Snapshot::new(dir.path().join("snap.txt"));

    let mut ks = Keyspace::new();
    ks.set("s".into(), "text".into(), None);
    ks.push_back("q", vec!["a".into(), "b".into()]).unwrap();

    assert_eq!(snapshot.save(&ks).unwrap(), 1);
    assert_eq!(snapshot.load().unwrap(), vec![("s".to_string(), "text".to_string())]);
}

#[test]
fn snapshot_load_ignores_malformed_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snap.txt");
    std::fs::write(&path, "SET good value\nDEL bad\nSET short\ngarbage\n").unwrap();

    let entries = Snapshot::new(path).load().unwrap();
    assert_eq!(entries, vec![("good".to_string(), "value".to_string())]);
}

#[test]
fn snapshot_load_of_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let snapshot = Snapshot::new(dir.path().join("never_saved.txt"));
    assert!(snapshot.load().unwrap().is_empty());
}

#[test]
fn save_truncates_the_previous_snapshot() {
    let dir = tempdir().unwrap();
    let snapshot = Snapshot::new(dir.path().join("snap.txt"));

    let mut ks = Keyspace::new();
    ks.set("a".into(), "1".into(), None);
    ks.set("b".into(), "2".into(), None);
    snapshot.save(&ks).unwrap();

    ks.del("b");
    snapshot.save(&ks).unwrap();

    assert_eq!(snapshot.load().unwrap(), vec![("a".to_string(), "1".to_string())]);
}

// =====================================================================
// Snapshot timer
// =====================================================================

#[test]
fn timer_is_not_due_until_interval_elapses() {
    let timer = SnapshotTimer::new(Duration::from_secs(3600));
    assert!(!timer.due());
}

#[test]
fn timer_becomes_due_and_resets_on_mark() {
    let timer = SnapshotTimer::new(Duration::from_millis(30));
    std::thread::sleep(Duration::from_millis(50));
    assert!(timer.due());

    timer.mark();
    assert!(!timer.due());
}
