use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{StorageError, StorageResult};
use crate::key::NamespacedKey;

/// The in-process medium owned by the facade.
///
/// Entries are keyed by the full [`NamespacedKey`] rather than just its name.
/// While override mode redirects writes here, each entry still remembers the
/// backend it was declared for, which is what lets
/// [`crate::KeyValueStorage::synchronize`] replay it into the right place.
#[derive(Debug, Default)]
pub struct VolatileStore {
    entries: Mutex<HashMap<NamespacedKey, Vec<u8>>>,
}

impl VolatileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> StorageResult<MutexGuard<'_, HashMap<NamespacedKey, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| StorageError::poisoned("volatile store"))
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn put(&self, key: &NamespacedKey, value: &[u8]) -> StorageResult<()> {
        self.entries()?.insert(key.clone(), value.to_vec());
        Ok(())
    }

    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn get(&self, key: &NamespacedKey) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    /// Removes the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn delete(&self, key: &NamespacedKey) -> StorageResult<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    /// Removes every entry, whatever backend it was declared for.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn clear(&self) -> StorageResult<()> {
        self.entries()?.clear();
        Ok(())
    }

    /// Copies out every entry, sorted by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn snapshot(&self) -> StorageResult<Vec<(NamespacedKey, Vec<u8>)>> {
        let mut entries: Vec<_> = self
            .entries()?
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    /// Returns the number of entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.entries()?.len())
    }

    /// Returns `true` if the store holds no entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.entries()?.is_empty())
    }
}
