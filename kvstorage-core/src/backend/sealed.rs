use std::sync::Arc;

use super::{Backend, DeviceKeystore};
use crate::error::StorageResult;

/// Domain separation prefix bound into every sealed value.
const SEALED_VALUE_AD: &[u8] = b"kvstorage:secure-value:";

/// Secure backend that seals values through a [`DeviceKeystore`].
///
/// Values are encrypted before they reach the inner backend, so the inner
/// medium only ever holds ciphertext. The key name is bound as associated
/// data: ciphertext copied from one key to another fails to open.
pub struct SealedBackend {
    inner: Arc<dyn Backend>,
    keystore: Arc<dyn DeviceKeystore>,
}

impl std::fmt::Debug for SealedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedBackend").finish_non_exhaustive()
    }
}

impl SealedBackend {
    /// Wraps `inner`, sealing every value with `keystore`.
    #[must_use]
    pub fn new(inner: Arc<dyn Backend>, keystore: Arc<dyn DeviceKeystore>) -> Self {
        Self { inner, keystore }
    }

    fn associated_data(key: &str) -> Vec<u8> {
        let mut ad = Vec::with_capacity(SEALED_VALUE_AD.len() + key.len());
        ad.extend_from_slice(SEALED_VALUE_AD);
        ad.extend_from_slice(key.as_bytes());
        ad
    }
}

impl Backend for SealedBackend {
    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let sealed = self.keystore.seal(&Self::associated_data(key), value)?;
        self.inner.put(key, &sealed)
    }

    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner
            .get(key)?
            .map(|sealed| self.keystore.open(&Self::associated_data(key), &sealed))
            .transpose()
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key)
    }

    fn clear(&self) -> StorageResult<()> {
        self.inner.clear()
    }

    fn contains(&self, key: &str) -> StorageResult<bool> {
        self.inner.contains(key)
    }
}
