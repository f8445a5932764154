//! Backend abstraction traits and the bundled implementations.
//!
//! The facade depends only on the [`Backend`] trait for its persistent media.
//! Each platform supplies implementations backed by its native primitives:
//!
//! ## iOS (Swift)
//! - Secure: Keychain Services generic passwords
//! - Preferences: `UserDefaults`
//!
//! ## Android (Kotlin)
//! - Secure: `EncryptedSharedPreferences` / Android Keystore
//! - Preferences: `SharedPreferences`
//!
//! ## Native (Rust)
//! - Secure: [`SealedBackend`] over a [`FileBackend`], sealing through a
//!   platform [`DeviceKeystore`]
//! - Preferences: [`FileBackend`]
//!
//! The volatile medium is always the in-process [`VolatileStore`] owned by
//! the facade.

mod file;
mod memory;
mod sealed;
mod volatile;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use sealed::SealedBackend;
pub use volatile::VolatileStore;

use crate::error::StorageResult;

/// Byte-level key-value CRUD over one physical medium.
///
/// # Contract
///
/// - `put` overwrites any existing value for the key.
/// - `get` returns `Ok(None)` for an unset key; absence is not an error.
/// - `delete` is idempotent; deleting an absent key succeeds.
/// - `clear` removes every key this backend owns and nothing else.
///
/// The facade serializes calls per backend, so implementations only need to
/// be consistent under that discipline. Bundled implementations also lock
/// internally and are safe to share directly.
pub trait Backend: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium rejects the write.
    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read. A missing key is
    /// `Ok(None)`.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Removes the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error only for actual medium failures.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// Removes every value owned by this backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be cleared.
    fn clear(&self) -> StorageResult<()>;

    /// Checks whether a value is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Device-protected encryption used by [`SealedBackend`].
///
/// Platform implementations should use hardware-backed keystores where
/// available and MUST use authenticated encryption, so that a mismatch in
/// `associated_data` between `seal` and `open` fails.
pub trait DeviceKeystore: Send + Sync {
    /// Encrypts `plaintext` with the device-bound key.
    ///
    /// # Errors
    ///
    /// Returns an error if the keystore is unavailable or refuses the
    /// operation.
    fn seal(&self, associated_data: &[u8], plaintext: &[u8]) -> StorageResult<Vec<u8>>;

    /// Decrypts `ciphertext` produced by [`DeviceKeystore::seal`].
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails, the ciphertext is malformed
    /// or the keystore is unavailable.
    fn open(&self, associated_data: &[u8], ciphertext: &[u8]) -> StorageResult<Vec<u8>>;
}
