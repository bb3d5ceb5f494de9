//! Integration tests for the file-backed run history ledger.

mod common;

use common::*;
use serde_json::json;
use tr_core::history::{FilePort, RunHistoryStore};
use tr_protocol::MAX_RUN_HISTORY;

#[test]
fn test_history_survives_reload() {
    let dir = history_dir().unwrap();
    let path = dir.path().join("run-history.json");

    let mut store = RunHistoryStore::load(FilePort::new(&path));
    store.append(sample_record("a"));
    store.append(sample_record("b"));

    let reloaded = RunHistoryStore::load(FilePort::new(&path));
    let ids: Vec<_> = reloaded.runs().iter().map(|r| r.trace_id.as_str()).collect();
    assert_eq!(ids, ["b", "a"]);
}

#[test]
fn test_corrupt_history_file_loads_empty() {
    let dir = history_dir().unwrap();
    let path = dir.path().join("run-history.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut store = RunHistoryStore::load(FilePort::new(&path));
    assert!(store.is_empty());

    store.append(sample_record("fresh"));
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written.as_array().map(Vec::len), Some(1));
}

#[test]
fn test_oversized_history_file_is_truncated_on_load() {
    let dir = history_dir().unwrap();
    let path = dir.path().join("run-history.json");
    let runs: Vec<_> = (0..MAX_RUN_HISTORY + 20)
        .map(|i| serde_json::to_value(sample_record(&format!("r{i}"))).unwrap())
        .collect();
    std::fs::write(&path, json!(runs).to_string()).unwrap();

    let store = RunHistoryStore::load(FilePort::new(&path));
    assert_eq!(store.len(), MAX_RUN_HISTORY);
    assert_eq!(store.runs()[0].trace_id, "r0");
}

#[test]
fn test_unwritable_location_is_not_fatal() {
    let dir = history_dir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "file, not a directory").unwrap();

    let mut store = RunHistoryStore::load(FilePort::new(blocker.join("run-history.json")));
    store.append(sample_record("kept-in-memory"));
    assert_eq!(store.len(), 1);
}
