//! Local client storage - plain string key/value pairs kept beside the app
//!
//! Holds the weekly reset watermark and the default rest duration. Values are
//! stored as a flat JSON object so the file stays hand-editable.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::error::StoreError;
use crate::timespec::parse_time_to_seconds;

/// Watermark: last ISO week for which completion flags were reset
pub const LAST_RESET_WEEK_KEY: &str = "lastResetWeek";
/// Default rest between sets, as a time-spec
pub const DEFAULT_REST_KEY: &str = "defaultRest";
pub const DEFAULT_REST: &str = "60";

/// String key/value storage with no expiry
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// JSON file backed storage; the whole file is rewritten on every change
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Load the file if it exists. A corrupt file is logged and treated as empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("Ignoring unreadable settings file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.lock();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.lock();
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(key);
        Ok(())
    }
}

/// Current default rest time-spec ("60" when unset)
pub fn default_rest(storage: &dyn KeyValueStore) -> String {
    storage
        .get(DEFAULT_REST_KEY)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REST.to_string())
}

/// Empty value clears the setting back to the default
pub fn set_default_rest(storage: &dyn KeyValueStore, value: &str) -> Result<(), StoreError> {
    let value = value.trim();
    if value.is_empty() {
        storage.remove(DEFAULT_REST_KEY)
    } else {
        storage.set(DEFAULT_REST_KEY, value)
    }
}

/// Default rest in seconds
pub fn rest_seconds(storage: &dyn KeyValueStore) -> u32 {
    parse_time_to_seconds(&default_rest(storage))
}

pub fn last_reset_week(storage: &dyn KeyValueStore) -> Option<String> {
    storage.get(LAST_RESET_WEEK_KEY)
}

pub fn set_last_reset_week(storage: &dyn KeyValueStore, week: &str) -> Result<(), StoreError> {
    storage.set(LAST_RESET_WEEK_KEY, week)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rest_fallback() {
        let storage = MemoryStorage::new();
        assert_eq!(default_rest(&storage), "60");
        assert_eq!(rest_seconds(&storage), 60);

        set_default_rest(&storage, "2min").unwrap();
        assert_eq!(default_rest(&storage), "2min");
        assert_eq!(rest_seconds(&storage), 120);

        set_default_rest(&storage, "  ").unwrap();
        assert_eq!(default_rest(&storage), "60");
    }

    #[test]
    fn test_file_storage_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        {
            let storage = FileStorage::open(&path).unwrap();
            assert_eq!(last_reset_week(&storage), None);
            set_last_reset_week(&storage, "2024-W01").unwrap();
            set_default_rest(&storage, "90s").unwrap();
        }

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(last_reset_week(&storage).as_deref(), Some("2024-W01"));
        assert_eq!(rest_seconds(&storage), 90);

        storage.remove(DEFAULT_REST_KEY).unwrap();
        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(rest_seconds(&storage), 60);
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get(LAST_RESET_WEEK_KEY), None);
    }
}
