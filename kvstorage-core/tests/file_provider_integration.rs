//! File-backed provider: persistence across reopen and sealing of secure values.

mod common;

use std::fs;
use std::sync::Arc;

use common::InMemoryKeystore;
use kvstorage_core::{
    Backend, BackendTag, FileBackend, FileStorageProvider, KeyValueStorage, NamespacedKey,
    StoragePaths, StorageProvider,
};

const TOKEN: NamespacedKey = NamespacedKey::secure("token");
const THEME: NamespacedKey = NamespacedKey::preferences("theme");

#[test]
fn test_values_persist_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let keystore = Arc::new(InMemoryKeystore::new());

    let storage = common::file_storage(dir.path(), keystore.clone());
    assert!(storage.set(&TOKEN, "abc"));
    assert!(storage.set(&THEME, "dark"));
    drop(storage);

    let reopened = common::file_storage(dir.path(), keystore);
    assert_eq!(reopened.get::<String>(&TOKEN).as_deref(), Some("abc"));
    assert_eq!(reopened.get::<String>(&THEME).as_deref(), Some("dark"));
}

#[test]
fn test_secure_files_hold_ciphertext_only() {
    let dir = tempfile::tempdir().unwrap();
    let paths = StoragePaths::new(dir.path());
    let storage = common::file_storage(dir.path(), Arc::new(InMemoryKeystore::new()));

    assert!(storage.set(&TOKEN, "super-secret-value"));
    assert!(storage.set(&THEME, "dark"));

    let raw_secure = FileBackend::new(paths.secure_dir()).unwrap();
    let sealed = raw_secure.get("token").unwrap().unwrap();
    assert!(!sealed
        .windows(b"super-secret-value".len())
        .any(|w| w == b"super-secret-value"));

    let raw_preferences = FileBackend::new(paths.preferences_dir()).unwrap();
    assert_eq!(
        raw_preferences.get("theme").unwrap(),
        Some(b"\"dark\"".to_vec())
    );
}

#[test]
fn test_different_keystore_cannot_read_secure_values() {
    let dir = tempfile::tempdir().unwrap();
    let storage = common::file_storage(dir.path(), Arc::new(InMemoryKeystore::new()));
    assert!(storage.set(&TOKEN, "abc"));
    assert!(storage.set(&THEME, "dark"));
    drop(storage);

    let stranger = common::file_storage(dir.path(), Arc::new(InMemoryKeystore::new()));
    assert_eq!(stranger.get::<String>(&TOKEN), None);
    assert!(stranger.try_get::<String>(&TOKEN).is_err());
    assert_eq!(stranger.get::<String>(&THEME).as_deref(), Some("dark"));
}

#[test]
fn test_clean_removes_only_that_backend_directory_contents() {
    let dir = tempfile::tempdir().unwrap();
    let paths = StoragePaths::new(dir.path());
    let storage = common::file_storage(dir.path(), Arc::new(InMemoryKeystore::new()));
    assert!(storage.set(&TOKEN, "abc"));
    assert!(storage.set(&THEME, "dark"));

    assert!(storage.clean(BackendTag::Preferences));

    assert_eq!(fs::read_dir(paths.preferences_dir()).unwrap().count(), 0);
    assert_eq!(fs::read_dir(paths.secure_dir()).unwrap().count(), 1);
    assert_eq!(storage.get::<String>(&TOKEN).as_deref(), Some("abc"));
}

#[test]
fn test_provider_layout_and_synchronize_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let paths = StoragePaths::new(dir.path());
    let provider =
        FileStorageProvider::new(paths.clone(), Arc::new(InMemoryKeystore::new())).unwrap();
    assert!(provider.paths().preferences_dir().is_dir());
    assert!(provider.paths().secure_dir().is_dir());

    let storage = KeyValueStorage::from_provider(&provider);
    storage.set_override_active(true);
    assert!(storage.set(&THEME, "light"));
    assert!(!provider.preferences().contains("theme").unwrap());

    assert_eq!(storage.try_synchronize().unwrap(), 1);
    assert!(provider.preferences().contains("theme").unwrap());
}
