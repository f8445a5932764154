//! Platform providers assembling the persistent backends.

use std::sync::Arc;

use crate::backend::{Backend, DeviceKeystore, FileBackend, SealedBackend};
use crate::error::StorageResult;
use crate::paths::StoragePaths;

/// Provider responsible for the platform's persistent backends.
pub trait StorageProvider: Send + Sync {
    /// Returns the confidential credential backend.
    fn secure(&self) -> Arc<dyn Backend>;

    /// Returns the application preferences backend.
    fn preferences(&self) -> Arc<dyn Backend>;
}

/// File-backed provider for native hosts.
///
/// Preferences are plain files under [`StoragePaths::preferences_dir`];
/// secure values are sealed with the given keystore and written under
/// [`StoragePaths::secure_dir`].
pub struct FileStorageProvider {
    paths: StoragePaths,
    secure: Arc<dyn Backend>,
    preferences: Arc<dyn Backend>,
}

impl std::fmt::Debug for FileStorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorageProvider")
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

impl FileStorageProvider {
    /// Creates the backend directories and wires up the backends.
    ///
    /// # Errors
    ///
    /// Returns an error if either backend directory cannot be created.
    pub fn new(paths: StoragePaths, keystore: Arc<dyn DeviceKeystore>) -> StorageResult<Self> {
        let preferences = FileBackend::new(paths.preferences_dir())?;
        let secure_files = FileBackend::new(paths.secure_dir())?;
        let secure = SealedBackend::new(Arc::new(secure_files), keystore);
        Ok(Self {
            paths,
            secure: Arc::new(secure),
            preferences: Arc::new(preferences),
        })
    }

    /// Returns the paths this provider writes under.
    #[must_use]
    pub const fn paths(&self) -> &StoragePaths {
        &self.paths
    }
}

impl StorageProvider for FileStorageProvider {
    fn secure(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.secure)
    }

    fn preferences(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.preferences)
    }
}
