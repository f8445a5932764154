//! Typed key-value storage over secure, preferences and volatile backends.
//!
//! Values are addressed by a [`NamespacedKey`] that names both the key and
//! the medium it lives in. [`KeyValueStorage`] encodes values with a
//! [`Codec`] (JSON by default), routes them to the matching [`Backend`], and
//! can temporarily redirect every operation to process memory ("override
//! mode") and later replay the buffered writes with
//! [`KeyValueStorage::synchronize`].
//!
//! ```rust
//! use kvstorage_core::{BackendTag, KeyValueStorage, NamespacedKey};
//!
//! const TOKEN: NamespacedKey = NamespacedKey::secure("token");
//!
//! let storage = KeyValueStorage::in_memory();
//! storage.set_override_active(true);
//! assert!(storage.set(&TOKEN, "abc"));
//! storage.synchronize();
//!
//! storage.set_override_active(false);
//! assert_eq!(storage.get::<String>(&TOKEN).as_deref(), Some("abc"));
//! assert!(storage.clean(BackendTag::Secure));
//! ```

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod backend;
pub use backend::{
    Backend, DeviceKeystore, FileBackend, MemoryBackend, SealedBackend, VolatileStore,
};

pub mod codec;
pub use codec::{CborCodec, Codec, JsonCodec};

mod error;
pub use error::{StorageError, StorageResult};

mod key;
pub use key::{BackendTag, NamespacedKey, ParseKeyError};

mod paths;
pub use paths::StoragePaths;

mod provider;
pub use provider::{FileStorageProvider, StorageProvider};

mod storage;
pub use storage::KeyValueStorage;

#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
pub mod logger;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!("kvstorage_core");
