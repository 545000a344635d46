use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{FactorCache, FactorCacheEntry, ObservationEntry, ObservationPool, StorageError};

/// A pretty-printed JSON document guarded by an in-process lock.
struct JsonDocument {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonDocument {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded data lives on disk, so a poisoned lock carries no torn state.
        self.lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read<T: DeserializeOwned + Default>(&self) -> Result<T, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.display(),
                    source,
                })
            }
        };

        if text.trim().is_empty() {
            return Ok(T::default());
        }

        serde_json::from_str(&text).map_err(|source| StorageError::Decode {
            path: self.display(),
            source,
        })
    }

    fn write<T: Serialize>(&self, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_string_pretty(value).map_err(StorageError::Encode)?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                path: self.display(),
                source,
            })?;
        }
        fs::write(&self.path, encoded).map_err(|source| StorageError::Write {
            path: self.display(),
            source,
        })
    }

    fn load_or_empty<T: DeserializeOwned + Default>(&self) -> T {
        match self.read() {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "store unreadable; treating as empty");
                T::default()
            }
        }
    }

    fn snapshot<T: DeserializeOwned + Default>(&self) -> T {
        let _guard = self.guard();
        self.load_or_empty()
    }

    /// Read-modify-write under the lock. `apply` returning `false` skips the write.
    fn mutate<T, F>(&self, apply: F) -> bool
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> bool,
    {
        let _guard = self.guard();
        let mut value: T = self.load_or_empty();
        if !apply(&mut value) {
            return false;
        }

        match self.write(&value) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "store write failed");
                false
            }
        }
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ObservationDocument {
    #[serde(default)]
    stocks: Vec<ObservationEntry>,
}

/// Observation pool persisted as `{"stocks": [...]}`.
pub struct JsonObservationPool {
    document: JsonDocument,
}

impl JsonObservationPool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.document.path
    }
}

impl ObservationPool for JsonObservationPool {
    fn list(&self) -> Vec<ObservationEntry> {
        self.document.snapshot::<ObservationDocument>().stocks
    }

    fn get(&self, code: &str) -> Option<ObservationEntry> {
        self.list().into_iter().find(|entry| entry.code == code)
    }

    fn insert(&self, entry: ObservationEntry) -> bool {
        self.document.mutate(|doc: &mut ObservationDocument| {
            if doc.stocks.iter().any(|existing| existing.code == entry.code) {
                debug!(code = %entry.code, "observation entry already present");
                return false;
            }
            doc.stocks.push(entry);
            true
        })
    }

    fn update(&self, code: &str, conclusion: &str) -> bool {
        self.document.mutate(|doc: &mut ObservationDocument| {
            match doc.stocks.iter_mut().find(|entry| entry.code == code) {
                Some(entry) => {
                    entry.conclusion = conclusion.to_string();
                    entry.timestamp = chrono::Utc::now();
                    true
                }
                None => false,
            }
        })
    }

    fn remove(&self, code: &str) -> bool {
        self.document.mutate(|doc: &mut ObservationDocument| {
            let before = doc.stocks.len();
            doc.stocks.retain(|entry| entry.code != code);
            doc.stocks.len() != before
        })
    }

    fn clear(&self) -> bool {
        self.document.mutate(|doc: &mut ObservationDocument| {
            doc.stocks.clear();
            true
        })
    }
}

/// Factor cache persisted as a JSON object keyed by stock code.
pub struct JsonFactorCache {
    document: JsonDocument,
}

impl JsonFactorCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.document.path
    }
}

type CacheDocument = BTreeMap<String, FactorCacheEntry>;

impl FactorCache for JsonFactorCache {
    fn get(&self, code: &str) -> Option<FactorCacheEntry> {
        self.document.snapshot::<CacheDocument>().remove(code)
    }

    fn all(&self) -> Vec<FactorCacheEntry> {
        self.document
            .snapshot::<CacheDocument>()
            .into_values()
            .collect()
    }

    fn put(&self, entry: FactorCacheEntry) -> bool {
        self.document.mutate(|doc: &mut CacheDocument| {
            doc.insert(entry.stock_code.clone(), entry);
            true
        })
    }

    fn remove(&self, code: &str) -> bool {
        self.document
            .mutate(|doc: &mut CacheDocument| doc.remove(code).is_some())
    }

    fn clear(&self) -> bool {
        self.document.mutate(|doc: &mut CacheDocument| {
            doc.clear();
            true
        })
    }
}
