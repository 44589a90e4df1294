//! services/app/src/adapters/storage.rs
//!
//! Local key-value storage adapters. The file-backed store plays the role
//! browser localStorage plays in a web client: a single shared mutable
//! resource holding tokens, the serialized profile, and seen-state.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use edudash_core::ports::{KeyValueStore, PortError, PortResult};
use tracing::warn;

//=========================================================================================
// In-Memory Store
//=========================================================================================

/// An ephemeral store. Used by tests and as the fallback when no state
/// path is writable.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.data.lock().unwrap().remove(key);
    }
}

//=========================================================================================
// File-Backed Store
//=========================================================================================

/// A store persisted as one JSON object in a single file.
///
/// Reads come from an in-memory cache loaded at construction; every write
/// flushes the whole map back to disk. A missing or unreadable file is
/// treated as empty rather than an error. Writes across two concurrent
/// processes can race (last write wins), which is acceptable for this
/// non-critical state.
pub struct FileStore {
    path: PathBuf,
    data: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        let data = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Discarding unreadable state file {}: {e}", path.display());
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    fn flush(&self, data: &HashMap<String, String>) -> PortResult<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut data = self.data.lock().unwrap();
        data.insert(key.to_string(), value.to_string());
        self.flush(&data)
    }

    fn remove(&self, key: &str) {
        let mut data = self.data.lock().unwrap();
        data.remove(key);
        if let Err(e) = self.flush(&data) {
            warn!("Failed to flush state file after remove: {e}");
        }
    }
}
