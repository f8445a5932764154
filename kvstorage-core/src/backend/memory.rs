use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::Backend;
use crate::error::{StorageError, StorageResult};

/// In-memory backend backed by a `HashMap`.
///
/// Stands in for a platform medium in tests and on hosts that have no
/// persistent store for a given backend. Writes can be made to fail on demand
/// to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Vec<u8>)>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();
        Self {
            entries: Mutex::new(entries),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent `put`, `delete` and `clear` fail (or succeed
    /// again when `fail` is `false`). Reads are unaffected.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot_guard().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot_guard().is_empty()
    }

    /// Returns all stored key names, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.snapshot_guard().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn entries(&self) -> StorageResult<MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| StorageError::poisoned("memory backend"))
    }

    // Inspection helpers tolerate poisoning; the map itself is never left
    // half-updated by a single insert or remove.
    fn snapshot_guard(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self, operation: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::InjectedFailure(format!(
                "memory backend {operation} disabled"
            )));
        }
        Ok(())
    }
}

impl Backend for MemoryBackend {
    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.check_writable("put")?;
        self.entries()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.check_writable("delete")?;
        self.entries()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.check_writable("clear")?;
        self.entries()?.clear();
        Ok(())
    }

    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.entries()?.contains_key(key))
    }
}
