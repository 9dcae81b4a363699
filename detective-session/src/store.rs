//! Key-value stores backing the credential slot
//!
//! [`FileStore`] persists a flat JSON object on disk; [`MemoryStore`] keeps everything in
//! process and is what tests inject.

use detective_core::{
    storage_error, DetectiveError, DetectiveResult, ErrorContext, KeyValueStore,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

fn lock<'a>(
    entries: &'a Mutex<BTreeMap<String, String>>,
    component: &str,
) -> DetectiveResult<MutexGuard<'a, BTreeMap<String, String>>> {
    entries.lock().map_err(|_| DetectiveError::Internal {
        message: "Key-value store lock poisoned".to_string(),
        source: None,
        context: ErrorContext::new(component).with_operation("lock"),
    })
}

/// In-memory store; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one entry
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> DetectiveResult<Option<String>> {
        Ok(lock(&self.entries, "memory_store")?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> DetectiveResult<()> {
        lock(&self.entries, "memory_store")?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> DetectiveResult<()> {
        lock(&self.entries, "memory_store")?.remove(key);
        Ok(())
    }
}

/// Store persisted as a JSON object file, rewritten on every change
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating the parent directory if needed.
    ///
    /// A missing file is an empty store; an unreadable or malformed one is an error.
    pub fn open<P: AsRef<Path>>(path: P) -> DetectiveResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                storage_error!(
                    format!("Failed to create data directory {:?}: {}", parent, e),
                    "file_store",
                    e
                )
            })?;
        }

        let entries = if path.exists() {
            let data = std::fs::read_to_string(&path).map_err(|e| {
                storage_error!(
                    format!("Failed to read store {:?}: {}", path, e),
                    "file_store",
                    e
                )
            })?;

            if data.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&data).map_err(|e| DetectiveError::Storage {
                    message: format!("Store file {:?} is corrupt: {}", path, e),
                    source: Some(Box::new(e)),
                    context: ErrorContext::new("file_store")
                        .with_operation("open")
                        .with_suggestion("Delete the file to start with an empty store"),
                })?
            }
        } else {
            BTreeMap::new()
        };

        info!("Opened key-value store at {:?}", path);

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write via a temporary file and rename, so a crash never leaves a torn file
    fn flush(&self, entries: &BTreeMap<String, String>) -> DetectiveResult<()> {
        let data = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");

        std::fs::write(&tmp, data).map_err(|e| {
            storage_error!(
                format!("Failed to write store {:?}: {}", tmp, e),
                "file_store",
                e
            )
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            storage_error!(
                format!("Failed to replace store {:?}: {}", self.path, e),
                "file_store",
                e
            )
        })?;

        debug!("Saved {} entries to {:?}", entries.len(), self.path);
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> DetectiveResult<Option<String>> {
        Ok(lock(&self.entries, "file_store")?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> DetectiveResult<()> {
        let mut entries = lock(&self.entries, "file_store")?;
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&entries) {
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> DetectiveResult<()> {
        let mut entries = lock(&self.entries, "file_store")?;
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush(&entries) {
            entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}
