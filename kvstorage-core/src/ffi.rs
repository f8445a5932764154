//! Foreign-language surface exported through `UniFFI`.
//!
//! Generic `set`/`get` cannot cross the FFI boundary, so [`KeyValueStore`]
//! exposes one typed accessor pair per primitive. Values written here use the
//! same JSON encoding as [`KeyValueStorage`], so Rust and host code can share
//! keys.

use std::sync::Arc;

use crate::backend::{Backend, DeviceKeystore};
use crate::error::StorageResult;
use crate::key::{BackendTag, NamespacedKey};
use crate::paths::StoragePaths;
use crate::provider::FileStorageProvider;
use crate::storage::KeyValueStorage;

/// A persistent medium implemented by the host (Keychain, `UserDefaults`,
/// `SharedPreferences`, ...).
///
/// Same contract as [`Backend`]: `get` of an unset key returns `None`,
/// `delete` of an unset key succeeds, `clear` removes only this medium's keys.
#[uniffi::export(with_foreign)]
pub trait ForeignBackend: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium rejects the write.
    fn put(&self, key: String, value: Vec<u8>) -> StorageResult<()>;

    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    fn get(&self, key: String) -> StorageResult<Option<Vec<u8>>>;

    /// Removes the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium rejects the delete.
    fn delete(&self, key: String) -> StorageResult<()>;

    /// Removes every key owned by this medium.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be cleared.
    fn clear(&self) -> StorageResult<()>;
}

/// Device keystore implemented by the host.
#[uniffi::export(with_foreign)]
pub trait ForeignKeystore: Send + Sync {
    /// Seals plaintext under the device-bound key, authenticating
    /// `associated_data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the keystore refuses the operation.
    fn seal(&self, associated_data: Vec<u8>, plaintext: Vec<u8>) -> StorageResult<Vec<u8>>;

    /// Opens ciphertext sealed with the same associated data.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    fn open_sealed(&self, associated_data: Vec<u8>, ciphertext: Vec<u8>)
        -> StorageResult<Vec<u8>>;
}

struct ForeignBackendAdapter(Arc<dyn ForeignBackend>);

impl Backend for ForeignBackendAdapter {
    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.0.put(key.to_string(), value.to_vec())
    }

    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.0.get(key.to_string())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.0.delete(key.to_string())
    }

    fn clear(&self) -> StorageResult<()> {
        self.0.clear()
    }
}

struct ForeignKeystoreAdapter(Arc<dyn ForeignKeystore>);

impl DeviceKeystore for ForeignKeystoreAdapter {
    fn seal(&self, associated_data: &[u8], plaintext: &[u8]) -> StorageResult<Vec<u8>> {
        self.0.seal(associated_data.to_vec(), plaintext.to_vec())
    }

    fn open(&self, associated_data: &[u8], ciphertext: &[u8]) -> StorageResult<Vec<u8>> {
        self.0
            .open_sealed(associated_data.to_vec(), ciphertext.to_vec())
    }
}

/// A backend-qualified key as seen by host code.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct StorageKey {
    /// Medium the key belongs to.
    pub backend: BackendTag,
    /// Key name within that medium.
    pub name: String,
}

impl From<StorageKey> for NamespacedKey {
    fn from(key: StorageKey) -> Self {
        Self::owned(key.backend, key.name)
    }
}

/// Key-value storage handle for Swift and Kotlin.
#[derive(Debug, uniffi::Object)]
pub struct KeyValueStore {
    inner: KeyValueStorage,
}

#[uniffi::export]
impl KeyValueStore {
    /// Creates a store over host-implemented secure and preferences media.
    #[uniffi::constructor]
    #[must_use]
    pub fn new(secure: Arc<dyn ForeignBackend>, preferences: Arc<dyn ForeignBackend>) -> Self {
        Self {
            inner: KeyValueStorage::new_with_components(
                Arc::new(ForeignBackendAdapter(secure)),
                Arc::new(ForeignBackendAdapter(preferences)),
            ),
        }
    }

    /// Creates a file-backed store under `root`, sealing secure values with
    /// the host keystore.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directories cannot be created.
    #[uniffi::constructor]
    pub fn with_directory(root: &str, keystore: Arc<dyn ForeignKeystore>) -> StorageResult<Self> {
        let provider = FileStorageProvider::new(
            StoragePaths::new(root),
            Arc::new(ForeignKeystoreAdapter(keystore)),
        )?;
        Ok(Self {
            inner: KeyValueStorage::from_provider(&provider),
        })
    }

    /// Creates a store that keeps everything in process memory.
    #[uniffi::constructor]
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            inner: KeyValueStorage::in_memory(),
        }
    }

    /// Stores raw bytes, as-is.
    pub fn set_data(&self, key: StorageKey, value: &[u8]) -> bool {
        self.inner.set_raw(&key.into(), value)
    }

    /// Reads raw bytes.
    #[must_use]
    pub fn get_data(&self, key: StorageKey) -> Option<Vec<u8>> {
        self.inner.get_raw(&key.into())
    }

    /// Stores a string.
    pub fn set_string(&self, key: StorageKey, value: &str) -> bool {
        self.inner.set(&key.into(), value)
    }

    /// Reads a string. `None` if unset or not a string.
    #[must_use]
    pub fn get_string(&self, key: StorageKey) -> Option<String> {
        self.inner.get(&key.into())
    }

    /// Stores a signed integer.
    pub fn set_int(&self, key: StorageKey, value: i64) -> bool {
        self.inner.set(&key.into(), &value)
    }

    /// Reads a signed integer.
    #[must_use]
    pub fn get_int(&self, key: StorageKey) -> Option<i64> {
        self.inner.get(&key.into())
    }

    /// Stores a double. Non-finite values are not representable in JSON and
    /// read back as `None`.
    pub fn set_double(&self, key: StorageKey, value: f64) -> bool {
        self.inner.set(&key.into(), &value)
    }

    /// Reads a double.
    #[must_use]
    pub fn get_double(&self, key: StorageKey) -> Option<f64> {
        self.inner.get(&key.into())
    }

    /// Stores a boolean.
    pub fn set_bool(&self, key: StorageKey, value: bool) -> bool {
        self.inner.set(&key.into(), &value)
    }

    /// Reads a boolean.
    #[must_use]
    pub fn get_bool(&self, key: StorageKey) -> Option<bool> {
        self.inner.get(&key.into())
    }

    /// Returns `true` if a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: StorageKey) -> bool {
        self.inner.contains(&key.into())
    }

    /// Removes the value under `key`.
    pub fn remove(&self, key: StorageKey) -> bool {
        self.inner.remove(&key.into())
    }

    /// Clears one backend.
    pub fn clean(&self, backend: BackendTag) -> bool {
        self.inner.clean(backend)
    }

    /// Clears every backend.
    pub fn clean_all(&self) -> bool {
        self.inner.clean_all()
    }

    /// Flushes values buffered in override mode to their declared backends.
    pub fn synchronize(&self) {
        self.inner.synchronize();
    }

    /// Redirects every operation to process memory while `active`.
    pub fn set_override_active(&self, active: bool) {
        self.inner.set_override_active(active);
    }

    /// Returns `true` while override mode is on.
    #[must_use]
    pub fn is_override_active(&self) -> bool {
        self.inner.is_override_active()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct HostDefaults {
        entries: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl ForeignBackend for HostDefaults {
        fn put(&self, key: String, value: Vec<u8>) -> StorageResult<()> {
            self.entries.lock().unwrap().insert(key, value);
            Ok(())
        }

        fn get(&self, key: String) -> StorageResult<Option<Vec<u8>>> {
            Ok(self.entries.lock().unwrap().get(&key).cloned())
        }

        fn delete(&self, key: String) -> StorageResult<()> {
            self.entries.lock().unwrap().remove(&key);
            Ok(())
        }

        fn clear(&self) -> StorageResult<()> {
            self.entries.lock().unwrap().clear();
            Ok(())
        }
    }

    // Reversible stand-in; the associated data is prepended so mismatches
    // are detected.
    struct PlainKeystore;

    impl ForeignKeystore for PlainKeystore {
        fn seal(&self, associated_data: Vec<u8>, plaintext: Vec<u8>) -> StorageResult<Vec<u8>> {
            Ok([associated_data, plaintext].concat())
        }

        fn open_sealed(
            &self,
            associated_data: Vec<u8>,
            ciphertext: Vec<u8>,
        ) -> StorageResult<Vec<u8>> {
            ciphertext
                .strip_prefix(associated_data.as_slice())
                .map(<[u8]>::to_vec)
                .ok_or_else(|| crate::StorageError::keystore("associated data mismatch"))
        }
    }

    fn key(backend: BackendTag, name: &str) -> StorageKey {
        StorageKey {
            backend,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_typed_accessors() {
        let store = KeyValueStore::in_memory();
        let count = key(BackendTag::Preferences, "count");

        assert!(store.set_int(count.clone(), 15));
        assert_eq!(store.get_int(count.clone()), Some(15));
        assert_eq!(store.get_bool(count.clone()), None);
        assert_eq!(store.get_double(count.clone()), Some(15.0));

        assert!(store.set_bool(key(BackendTag::Volatile, "flag"), true));
        assert_eq!(store.get_bool(key(BackendTag::Volatile, "flag")), Some(true));

        assert!(store.set_data(key(BackendTag::Secure, "blob"), &[0, 1, 2]));
        assert_eq!(store.get_data(key(BackendTag::Secure, "blob")), Some(vec![0, 1, 2]));

        assert!(store.remove(count.clone()));
        assert!(!store.contains(count));
    }

    #[test]
    fn test_foreign_backends_receive_json() {
        let secure = Arc::new(HostDefaults::default());
        let preferences = Arc::new(HostDefaults::default());
        let store = KeyValueStore::new(secure.clone(), preferences.clone());

        assert!(store.set_string(key(BackendTag::Secure, "token"), "abc"));
        assert!(store.set_double(key(BackendTag::Preferences, "ratio"), 0.5));

        assert_eq!(
            secure.get("token".to_string()).unwrap(),
            Some(b"\"abc\"".to_vec())
        );
        assert_eq!(
            preferences.get("ratio".to_string()).unwrap(),
            Some(b"0.5".to_vec())
        );
    }

    #[test]
    fn test_override_and_synchronize() {
        let secure = Arc::new(HostDefaults::default());
        let store = KeyValueStore::new(secure.clone(), Arc::new(HostDefaults::default()));

        store.set_override_active(true);
        assert!(store.is_override_active());
        assert!(store.set_string(key(BackendTag::Secure, "token"), "abc"));
        assert_eq!(secure.get("token".to_string()).unwrap(), None);

        store.synchronize();
        assert_eq!(
            secure.get("token".to_string()).unwrap(),
            Some(b"\"abc\"".to_vec())
        );
        assert!(store.clean_all());
    }

    #[test]
    fn test_with_directory_seals_secure_values() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy().into_owned();
        let store = KeyValueStore::with_directory(&root, Arc::new(PlainKeystore)).unwrap();

        assert!(store.set_string(key(BackendTag::Secure, "token"), "abc"));
        assert!(store.set_int(key(BackendTag::Preferences, "count"), 3));
        drop(store);

        let reopened = KeyValueStore::with_directory(&root, Arc::new(PlainKeystore)).unwrap();
        assert_eq!(
            reopened.get_string(key(BackendTag::Secure, "token")),
            Some("abc".to_string())
        );
        assert_eq!(reopened.get_int(key(BackendTag::Preferences, "count")), Some(3));
        assert!(reopened.clean(BackendTag::Secure));
        assert_eq!(reopened.get_string(key(BackendTag::Secure, "token")), None);
    }
}
