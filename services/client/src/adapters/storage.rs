//! services/client/src/adapters/storage.rs
//!
//! A JSON file acting as the client's durable key/value storage.
//! It implements the `TokenStorage` port from the `core` crate.

use paper_desk_core::{PortError, PortResult, TokenStorage};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::warn;

type Entries = BTreeMap<String, String>;

/// Stores entries as one JSON object. Writes replace the file atomically.
pub struct FileTokenStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read(&self) -> PortResult<Entries> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(Entries::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| PortError::Unexpected(format!("{}: {}", self.path.display(), e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    fn write(&self, entries: &Entries) -> PortResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| PortError::Unexpected(e.to_string()))?;

        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let mut file =
            NamedTempFile::new_in(&dir).map_err(|e| PortError::Unexpected(e.to_string()))?;
        file.write_all(&json)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        file.persist(&self.path)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    fn update(&self, change: impl FnOnce(&mut Entries)) -> PortResult<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| PortError::Unexpected("storage lock poisoned".to_string()))?;
        // A file that cannot be read back is replaced rather than left to block
        // every later write.
        let mut entries = self.read().unwrap_or_else(|e| {
            warn!("Discarding unreadable session storage: {}", e);
            Entries::new()
        });
        change(&mut entries);
        self.write(&entries)
    }
}

impl TokenStorage for FileTokenStorage {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
