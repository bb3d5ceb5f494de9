//! Capacity-bounded, newest-first ledger of finished runs.
//!
//! The ledger is loaded once from its [`PersistencePort`] and written back
//! in full after every mutation. Storage failures never reach the caller:
//! a failed read yields an empty ledger and a failed write is logged.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};
use tr_protocol::{
    HistoryExport, ImportOutcome, RunRecord, HISTORY_EXPORT_VERSION, MAX_RUN_HISTORY,
};

use super::error::{HistoryError, HistoryResult};
use super::port::PersistencePort;

/// The persisted run ledger.
pub struct RunHistoryStore {
    port: Box<dyn PersistencePort>,
    runs: Vec<RunRecord>,
}

impl std::fmt::Debug for RunHistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunHistoryStore")
            .field("location", &self.port.location())
            .field("runs", &self.runs.len())
            .finish()
    }
}

impl RunHistoryStore {
    /// Load the ledger from `port`.
    ///
    /// A missing, unreadable or malformed blob yields an empty ledger.
    /// Entries that fail record validation are dropped.
    pub fn load(port: impl PersistencePort + 'static) -> Self {
        let runs = match port.read() {
            Ok(Some(blob)) => decode_ledger(&blob).unwrap_or_else(|| {
                warn!(location = %port.location(), "run history is malformed; starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read run history; starting empty");
                Vec::new()
            }
        };
        debug!(location = %port.location(), runs = runs.len(), "loaded run history");
        Self {
            port: Box::new(port),
            runs,
        }
    }

    /// Records, newest first.
    pub fn runs(&self) -> &[RunRecord] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Add a finished run at the top, dropping the oldest beyond the cap.
    pub fn append(&mut self, record: RunRecord) {
        self.runs.insert(0, record);
        self.runs.truncate(MAX_RUN_HISTORY);
        self.persist();
    }

    /// The export document for the current ledger.
    pub fn export_document(&self, exported_at: DateTime<Utc>) -> HistoryExport {
        HistoryExport {
            version: HISTORY_EXPORT_VERSION,
            exported_at,
            runs: self.runs.clone(),
        }
    }

    /// Serialize the ledger as a pretty-printed export document.
    pub fn export(&self) -> HistoryResult<String> {
        Ok(serde_json::to_string_pretty(
            &self.export_document(Utc::now()),
        )?)
    }

    /// Merge an export document into the ledger.
    ///
    /// Valid records are prepended in document order; malformed entries are
    /// dropped. A document without a `runs` array imports nothing.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::InvalidJson` if `json_text` does not parse and
    /// `HistoryError::InvalidFormat` if it is not shaped `{ "runs": [...] }`.
    pub fn import(&mut self, json_text: &str) -> HistoryResult<ImportOutcome> {
        let document: Value = serde_json::from_str(json_text)?;
        let runs = document
            .get("runs")
            .and_then(Value::as_array)
            .ok_or(HistoryError::InvalidFormat)?;

        let mut merged: Vec<RunRecord> = runs.iter().filter_map(RunRecord::from_valid_value).collect();
        let imported = merged.len();
        if imported < runs.len() {
            debug!(dropped = runs.len() - imported, "dropped malformed records on import");
        }

        merged.append(&mut self.runs);
        merged.truncate(MAX_RUN_HISTORY);
        self.runs = merged;
        self.persist();

        Ok(ImportOutcome {
            imported,
            message: format!("Imported {imported} run(s)."),
        })
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.runs.clear();
        self.persist();
    }

    fn persist(&self) {
        let blob = match serde_json::to_string(&self.runs) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "failed to serialize run history");
                return;
            }
        };
        if let Err(e) = self.port.write(&blob) {
            warn!(error = %e, "failed to persist run history");
        }
    }
}

fn decode_ledger(blob: &str) -> Option<Vec<RunRecord>> {
    if blob.trim().is_empty() {
        return Some(Vec::new());
    }
    let value: Value = serde_json::from_str(blob).ok()?;
    let mut runs: Vec<RunRecord> = value
        .as_array()?
        .iter()
        .filter_map(RunRecord::from_valid_value)
        .collect();
    runs.truncate(MAX_RUN_HISTORY);
    Some(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::port::MemoryPort;
    use serde_json::json;
    use tr_protocol::RunStatus;

    fn record(trace_id: &str) -> RunRecord {
        RunRecord::new(trace_id, 1_700_000_000_000, RunStatus::Ok, 4, 250, None)
    }

    fn record_json(trace_id: &str) -> Value {
        serde_json::to_value(record(trace_id)).unwrap()
    }

    fn trace_ids(store: &RunHistoryStore) -> Vec<&str> {
        store.runs().iter().map(|r| r.trace_id.as_str()).collect()
    }

    #[test]
    fn test_load_missing_blob_is_empty() {
        let store = RunHistoryStore::load(MemoryPort::new());
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_malformed_blob_is_empty() {
        for blob in ["not json", "{\"runs\": []}", "42"] {
            let store = RunHistoryStore::load(MemoryPort::with_blob(blob));
            assert!(store.is_empty(), "{blob} should load empty");
        }
    }

    #[test]
    fn test_load_drops_invalid_entries() {
        let blob = json!([record_json("a"), {"traceId": 1}, record_json("b")]).to_string();
        let store = RunHistoryStore::load(MemoryPort::with_blob(blob));
        assert_eq!(trace_ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_append_is_newest_first_and_persists() {
        let port = MemoryPort::new();
        let mut store = RunHistoryStore::load(port.clone());
        store.append(record("first"));
        store.append(record("second"));

        assert_eq!(trace_ids(&store), vec!["second", "first"]);
        let reloaded = RunHistoryStore::load(port);
        assert_eq!(trace_ids(&reloaded), vec!["second", "first"]);
    }

    #[test]
    fn test_append_caps_ledger() {
        let mut store = RunHistoryStore::load(MemoryPort::new());
        for i in 0..=MAX_RUN_HISTORY {
            store.append(record(&format!("run-{i}")));
        }

        assert_eq!(store.len(), MAX_RUN_HISTORY);
        assert_eq!(store.runs()[0].trace_id, format!("run-{MAX_RUN_HISTORY}"));
        assert_eq!(store.runs()[MAX_RUN_HISTORY - 1].trace_id, "run-1");
        assert!(store.runs().iter().all(|r| r.trace_id != "run-0"));
    }

    #[test]
    fn test_import_drops_malformed_records() {
        let mut store = RunHistoryStore::load(MemoryPort::new());
        store.append(record("existing"));

        let mut invalid = record_json("c");
        invalid.as_object_mut().unwrap().remove("timestamp");
        let document = json!({"runs": [record_json("a"), record_json("b"), invalid, record_json("d")]});

        let outcome = store.import(&document.to_string()).unwrap();
        assert_eq!(outcome.imported, 3);
        assert_eq!(outcome.message, "Imported 3 run(s).");
        assert_eq!(trace_ids(&store), vec!["a", "b", "d", "existing"]);
    }

    #[test]
    fn test_import_rejects_wrong_shape() {
        let mut store = RunHistoryStore::load(MemoryPort::new());
        store.append(record("existing"));

        let err = store.import("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, HistoryError::InvalidFormat));
        assert_eq!(err.to_string(), "Invalid format: expected { \"runs\": [...] }");

        let err = store.import("{\"runs\": 3}").unwrap_err();
        assert!(matches!(err, HistoryError::InvalidFormat));

        let err = store.import("{oops").unwrap_err();
        assert!(matches!(err, HistoryError::InvalidJson(_)));

        assert_eq!(trace_ids(&store), vec!["existing"]);
    }

    #[test]
    fn test_import_caps_ledger() {
        let mut store = RunHistoryStore::load(MemoryPort::new());
        store.append(record("old"));
        let runs: Vec<Value> = (0..MAX_RUN_HISTORY).map(|i| record_json(&format!("r{i}"))).collect();

        let outcome = store.import(&json!({ "runs": runs }).to_string()).unwrap();
        assert_eq!(outcome.imported, MAX_RUN_HISTORY);
        assert_eq!(store.len(), MAX_RUN_HISTORY);
        assert!(store.runs().iter().all(|r| r.trace_id != "old"));
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut source = RunHistoryStore::load(MemoryPort::new());
        source.append(record("a"));
        source.append(RunRecord::new(
            "b",
            1_700_000_000_500,
            RunStatus::Error,
            2,
            90,
            Some("enricher: timeout".to_string()),
        ));

        let exported = source.export().unwrap();
        let document: Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(document["version"], 1);
        assert!(document["exportedAt"].is_string());

        let mut target = RunHistoryStore::load(MemoryPort::new());
        let outcome = target.import(&exported).unwrap();
        assert_eq!(outcome.imported, 2);
        assert_eq!(target.runs(), source.runs());
    }

    #[test]
    fn test_clear_persists_empty_ledger() {
        let port = MemoryPort::new();
        let mut store = RunHistoryStore::load(port.clone());
        store.append(record("a"));
        store.clear();

        assert!(store.is_empty());
        assert_eq!(port.contents().as_deref(), Some("[]"));
    }
}
