//! Storage facade routing typed values to the secure, preferences and
//! volatile backends.
//!
//! # Routing
//!
//! Every operation resolves its target once, when it starts:
//!
//! - override mode off: the backend named by the key's [`BackendTag`];
//! - override mode on: the [`VolatileStore`], whatever the key declares.
//!
//! Toggling override mode is not synchronized with calls already in flight;
//! a call that has resolved its target finishes against that target.
//!
//! # Locking
//!
//! Each persistent backend sits behind its own mutex and the volatile store
//! has another. A lock covers exactly one backend call and is never held
//! while another backend is touched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::{Backend, MemoryBackend, VolatileStore};
use crate::codec::{Codec, JsonCodec};
use crate::error::{StorageError, StorageResult};
use crate::key::{BackendTag, NamespacedKey};
use crate::provider::StorageProvider;

/// A persistent backend plus the mutex serializing calls into it.
struct Lane {
    tag: BackendTag,
    backend: Arc<dyn Backend>,
    lock: Mutex<()>,
}

impl Lane {
    const fn new(tag: BackendTag, backend: Arc<dyn Backend>) -> Self {
        Self {
            tag,
            backend,
            lock: Mutex::new(()),
        }
    }

    fn with<R>(&self, op: impl FnOnce(&dyn Backend) -> StorageResult<R>) -> StorageResult<R> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StorageError::poisoned(format!("{} backend", self.tag)))?;
        op(self.backend.as_ref())
    }
}

/// A resolved routing target.
enum Medium<'a> {
    Volatile(&'a VolatileStore),
    Persistent(&'a Lane),
}

impl Medium<'_> {
    const fn tag(&self) -> BackendTag {
        match self {
            Self::Volatile(_) => BackendTag::Volatile,
            Self::Persistent(lane) => lane.tag,
        }
    }

    fn put(&self, key: &NamespacedKey, value: &[u8]) -> StorageResult<()> {
        match self {
            Self::Volatile(store) => store.put(key, value),
            Self::Persistent(lane) => lane.with(|backend| backend.put(key.name(), value)),
        }
    }

    fn get(&self, key: &NamespacedKey) -> StorageResult<Option<Vec<u8>>> {
        match self {
            Self::Volatile(store) => store.get(key),
            Self::Persistent(lane) => lane.with(|backend| backend.get(key.name())),
        }
    }

    fn delete(&self, key: &NamespacedKey) -> StorageResult<()> {
        match self {
            Self::Volatile(store) => store.delete(key),
            Self::Persistent(lane) => lane.with(|backend| backend.delete(key.name())),
        }
    }

    fn clear(&self) -> StorageResult<()> {
        match self {
            Self::Volatile(store) => store.clear(),
            Self::Persistent(lane) => lane.with(|backend| backend.clear()),
        }
    }
}

/// Typed key-value storage over three backends.
///
/// ```rust
/// use kvstorage_core::{KeyValueStorage, NamespacedKey};
///
/// const COUNT: NamespacedKey = NamespacedKey::preferences("count");
///
/// let storage = KeyValueStorage::in_memory();
/// assert!(storage.set(&COUNT, &15));
/// assert_eq!(storage.get::<i64>(&COUNT), Some(15));
/// assert!(storage.remove(&COUNT));
/// assert_eq!(storage.get::<i64>(&COUNT), None);
/// ```
///
/// The boolean and `Option` returning methods swallow errors (logging them
/// at `warn`); each has a `try_` twin returning the full [`StorageResult`].
pub struct KeyValueStorage<C = JsonCodec> {
    secure: Lane,
    preferences: Lane,
    volatile: VolatileStore,
    codec: C,
    override_active: AtomicBool,
}

impl<C> std::fmt::Debug for KeyValueStorage<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueStorage")
            .field("override_active", &self.override_active.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl KeyValueStorage<JsonCodec> {
    /// Creates a facade over explicit backends, using the JSON codec.
    #[must_use]
    pub fn new_with_components(secure: Arc<dyn Backend>, preferences: Arc<dyn Backend>) -> Self {
        Self {
            secure: Lane::new(BackendTag::Secure, secure),
            preferences: Lane::new(BackendTag::Preferences, preferences),
            volatile: VolatileStore::new(),
            codec: JsonCodec,
            override_active: AtomicBool::new(false),
        }
    }

    /// Creates a facade over the backends of a platform provider.
    #[must_use]
    pub fn from_provider(provider: &dyn StorageProvider) -> Self {
        Self::new_with_components(provider.secure(), provider.preferences())
    }

    /// Creates a facade whose secure and preferences backends are in-memory
    /// maps. Nothing outlives the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new_with_components(
            Arc::new(MemoryBackend::new()),
            Arc::new(MemoryBackend::new()),
        )
    }
}

impl<C: Codec> KeyValueStorage<C> {
    /// Replaces the codec. Values already stored are not re-encoded.
    #[must_use]
    pub fn with_codec<D: Codec>(self, codec: D) -> KeyValueStorage<D> {
        KeyValueStorage {
            secure: self.secure,
            preferences: self.preferences,
            volatile: self.volatile,
            codec,
            override_active: self.override_active,
        }
    }

    /// Returns the codec used for typed values.
    #[must_use]
    pub const fn codec(&self) -> &C {
        &self.codec
    }

    /// Returns the volatile store, which also buffers writes made in
    /// override mode.
    #[must_use]
    pub const fn volatile(&self) -> &VolatileStore {
        &self.volatile
    }

    /// Returns `true` while every operation is redirected to the volatile
    /// store.
    #[must_use]
    pub fn is_override_active(&self) -> bool {
        self.override_active.load(Ordering::SeqCst)
    }

    /// Turns override mode on or off. Data already stored is untouched;
    /// only later routing changes.
    pub fn set_override_active(&self, active: bool) {
        self.override_active.store(active, Ordering::SeqCst);
        log::debug!("storage override mode set to {active}");
    }

    fn medium(&self, tag: BackendTag) -> Medium<'_> {
        match tag {
            BackendTag::Secure => Medium::Persistent(&self.secure),
            BackendTag::Preferences => Medium::Persistent(&self.preferences),
            BackendTag::Volatile => Medium::Volatile(&self.volatile),
        }
    }

    fn resolve(&self, declared: BackendTag) -> Medium<'_> {
        if self.is_override_active() {
            Medium::Volatile(&self.volatile)
        } else {
            self.medium(declared)
        }
    }

    /// Encodes `value` and stores it under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Encoding`] if the value cannot be encoded, or
    /// the backend's error if the write fails.
    pub fn try_set<T: Serialize + ?Sized>(
        &self,
        key: &NamespacedKey,
        value: &T,
    ) -> StorageResult<()> {
        let bytes = self.codec.encode(value)?;
        self.try_set_raw(key, &bytes)
    }

    /// Encodes `value` and stores it under `key`. Returns `false` on failure.
    pub fn set<T: Serialize + ?Sized>(&self, key: &NamespacedKey, value: &T) -> bool {
        succeeded("set", key, self.try_set(key, value))
    }

    /// Stores already-encoded bytes under `key`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the write fails.
    pub fn try_set_raw(&self, key: &NamespacedKey, bytes: &[u8]) -> StorageResult<()> {
        let medium = self.resolve(key.backend());
        log::debug!("put {key} -> {}", medium.tag());
        medium.put(key, bytes)
    }

    /// Stores already-encoded bytes under `key`. Returns `false` on failure.
    pub fn set_raw(&self, key: &NamespacedKey, bytes: &[u8]) -> bool {
        succeeded("set_raw", key, self.try_set_raw(key, bytes))
    }

    /// Reads and decodes the value under `key`.
    ///
    /// Unlike [`KeyValueStorage::get`], a value that is present but does not
    /// decode as `T` is reported as [`StorageError::Decoding`].
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the read fails, or a decoding error.
    pub fn try_get<T: DeserializeOwned>(&self, key: &NamespacedKey) -> StorageResult<Option<T>> {
        self.try_get_raw(key)?
            .map(|bytes| self.codec.decode(&bytes))
            .transpose()
    }

    /// Reads and decodes the value under `key`.
    ///
    /// Returns `None` when the key is unset, when the read fails and when the
    /// stored bytes do not decode as `T`. Use [`KeyValueStorage::get_raw`] to
    /// tell "present but undecodable" apart from "absent".
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &NamespacedKey) -> Option<T> {
        self.try_get(key).unwrap_or_else(|err| {
            log::warn!("get {key} failed: {err}");
            None
        })
    }

    /// Reads the raw bytes under `key` without decoding.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the read fails.
    pub fn try_get_raw(&self, key: &NamespacedKey) -> StorageResult<Option<Vec<u8>>> {
        self.resolve(key.backend()).get(key)
    }

    /// Reads the raw bytes under `key` without decoding.
    #[must_use]
    pub fn get_raw(&self, key: &NamespacedKey) -> Option<Vec<u8>> {
        self.try_get_raw(key).unwrap_or_else(|err| {
            log::warn!("get_raw {key} failed: {err}");
            None
        })
    }

    /// Returns `true` if a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &NamespacedKey) -> bool {
        self.get_raw(key).is_some()
    }

    /// Removes the value under `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the delete fails.
    pub fn try_remove(&self, key: &NamespacedKey) -> StorageResult<()> {
        let medium = self.resolve(key.backend());
        log::debug!("delete {key} -> {}", medium.tag());
        medium.delete(key)
    }

    /// Removes the value under `key`. Returns `false` on failure.
    pub fn remove(&self, key: &NamespacedKey) -> bool {
        succeeded("remove", key, self.try_remove(key))
    }

    /// Clears one backend. In override mode the volatile store is cleared
    /// instead, whichever backend is named.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the clear fails.
    pub fn try_clean(&self, backend: BackendTag) -> StorageResult<()> {
        let medium = self.resolve(backend);
        log::debug!("clear {backend} -> {}", medium.tag());
        medium.clear()
    }

    /// Clears one backend. Returns `false` on failure.
    pub fn clean(&self, backend: BackendTag) -> bool {
        succeeded("clean", &backend, self.try_clean(backend))
    }

    /// Clears the volatile, preferences and secure backends, in that order.
    ///
    /// Every clear is attempted even after a failure, and clears that
    /// succeeded are not rolled back. Each clear follows the same override
    /// rule as [`KeyValueStorage::try_clean`].
    ///
    /// # Errors
    ///
    /// Returns the first failure encountered.
    pub fn try_clean_all(&self) -> StorageResult<()> {
        let mut first_error = None;
        for backend in [
            BackendTag::Volatile,
            BackendTag::Preferences,
            BackendTag::Secure,
        ] {
            if let Err(err) = self.try_clean(backend) {
                log::warn!("clean {backend} failed: {err}");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Clears all three backends. Returns `true` only if every clear
    /// succeeded.
    pub fn clean_all(&self) -> bool {
        self.try_clean_all().is_ok()
    }

    /// Flushes the volatile buffer into the backends its keys declare.
    ///
    /// Only acts in override mode; otherwise it returns `Ok(0)` without
    /// touching anything. Each buffered entry declared for the secure or
    /// preferences backend is written there as-is (no re-encoding). Entries
    /// stay in the volatile store and override mode stays on, so reads keep
    /// being served from memory until the owner turns override off.
    ///
    /// Replay targets are chosen explicitly, so the override flag is never
    /// flipped and concurrent callers keep being routed to memory.
    ///
    /// # Errors
    ///
    /// Every entry is attempted; the first write failure is returned after
    /// the pass completes.
    pub fn try_synchronize(&self) -> StorageResult<usize> {
        if !self.is_override_active() {
            return Ok(0);
        }

        let mut flushed = 0;
        let mut first_error = None;
        for (key, bytes) in self.volatile.snapshot()? {
            if key.backend() == BackendTag::Volatile {
                continue;
            }
            match self.medium(key.backend()).put(&key, &bytes) {
                Ok(()) => flushed += 1,
                Err(err) => {
                    log::warn!("synchronize {key} failed: {err}");
                    first_error.get_or_insert(err);
                }
            }
        }
        log::debug!("synchronize flushed {flushed} entries");
        first_error.map_or(Ok(flushed), Err)
    }

    /// Flushes the volatile buffer into the backends its keys declare.
    /// A no-op outside override mode.
    pub fn synchronize(&self) {
        if let Err(err) = self.try_synchronize() {
            log::warn!("synchronize incomplete: {err}");
        }
    }
}

fn succeeded(operation: &str, target: &dyn std::fmt::Display, result: StorageResult<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            log::warn!("{operation} {target} failed: {err}");
            false
        }
    }
}
