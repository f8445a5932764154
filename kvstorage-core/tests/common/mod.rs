//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    Key, XChaCha20Poly1305, XNonce,
};
use kvstorage_core::{
    DeviceKeystore, FileStorageProvider, KeyValueStorage, MemoryBackend, StorageError,
    StoragePaths, StorageResult,
};
use rand::{rngs::OsRng, RngCore};

pub struct InMemoryKeystore {
    key: [u8; 32],
}

impl InMemoryKeystore {
    pub fn new() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }
}

impl Default for InMemoryKeystore {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceKeystore for InMemoryKeystore {
    fn seal(&self, associated_data: &[u8], plaintext: &[u8]) -> StorageResult<Vec<u8>> {
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&self.key));
        let mut nonce_bytes = [0u8; 24];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = cipher
            .encrypt(
                XNonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: associated_data,
                },
            )
            .map_err(|err| StorageError::keystore(err.to_string()))?;
        let mut out = Vec::with_capacity(nonce_bytes.len() + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn open(&self, associated_data: &[u8], ciphertext: &[u8]) -> StorageResult<Vec<u8>> {
        if ciphertext.len() < 24 {
            return Err(StorageError::keystore("keystore ciphertext too short"));
        }
        let (nonce_bytes, payload) = ciphertext.split_at(24);
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&self.key));
        cipher
            .decrypt(
                XNonce::from_slice(nonce_bytes),
                Payload {
                    msg: payload,
                    aad: associated_data,
                },
            )
            .map_err(|err| StorageError::keystore(err.to_string()))
    }
}

/// Facade over two inspectable in-memory backends.
pub struct MemoryHarness {
    pub secure: Arc<MemoryBackend>,
    pub preferences: Arc<MemoryBackend>,
    pub storage: KeyValueStorage,
}

impl MemoryHarness {
    pub fn new() -> Self {
        let secure = Arc::new(MemoryBackend::new());
        let preferences = Arc::new(MemoryBackend::new());
        let storage = KeyValueStorage::new_with_components(secure.clone(), preferences.clone());
        Self {
            secure,
            preferences,
            storage,
        }
    }
}

pub fn file_storage(root: &Path, keystore: Arc<InMemoryKeystore>) -> KeyValueStorage {
    let provider =
        FileStorageProvider::new(StoragePaths::new(root), keystore).expect("create provider");
    KeyValueStorage::from_provider(&provider)
}
