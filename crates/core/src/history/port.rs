//! Persistence ports for the run history ledger.
//!
//! The store reads and writes one named blob. [`FilePort`] keeps it in a
//! file on disk; [`MemoryPort`] keeps it in memory for tests and for
//! sessions without a writable data directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::error::{HistoryError, HistoryResult};

/// Reads and writes the serialized ledger.
pub trait PersistencePort: Send + Sync {
    /// Read the stored blob. `Ok(None)` when nothing was stored yet.
    fn read(&self) -> HistoryResult<Option<String>>;

    /// Replace the stored blob.
    fn write(&self, blob: &str) -> HistoryResult<()>;

    /// Human-readable location, used in log lines.
    fn location(&self) -> String;
}

/// Ledger stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FilePort {
    path: PathBuf,
}

impl FilePort {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistencePort for FilePort {
    fn read(&self) -> HistoryResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HistoryError::storage(&self.path, e)),
        }
    }

    fn write(&self, blob: &str) -> HistoryResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| HistoryError::storage(parent, e))?;
        }
        fs::write(&self.path, blob).map_err(|e| HistoryError::storage(&self.path, e))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Ledger kept in memory. Clones share the same blob.
#[derive(Debug, Clone, Default)]
pub struct MemoryPort {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// A port pre-loaded with `blob`.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(blob.into()))),
        }
    }

    /// Current contents, if any.
    pub fn contents(&self) -> Option<String> {
        self.blob.lock().ok().and_then(|blob| blob.clone())
    }
}

impl PersistencePort for MemoryPort {
    fn read(&self) -> HistoryResult<Option<String>> {
        self.blob
            .lock()
            .map(|blob| blob.clone())
            .map_err(|e| HistoryError::storage("memory", e))
    }

    fn write(&self, blob: &str) -> HistoryResult<()> {
        let mut guard = self
            .blob
            .lock()
            .map_err(|e| HistoryError::storage("memory", e))?;
        *guard = Some(blob.to_string());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
