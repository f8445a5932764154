//! Storage path helpers.

use std::path::{Path, PathBuf};

const STORAGE_DIRNAME: &str = "kvstorage";
const PREFERENCES_DIRNAME: &str = "preferences";
const SECURE_DIRNAME: &str = "secure";

/// On-disk layout for file-backed stores under `<root>/kvstorage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    root: PathBuf,
    storage_dir: PathBuf,
}

impl StoragePaths {
    /// Builds storage paths rooted at `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let storage_dir = root.join(STORAGE_DIRNAME);
        Self { root, storage_dir }
    }

    /// Returns the storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory holding every backend's files.
    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Returns the directory of the preferences backend.
    #[must_use]
    pub fn preferences_dir(&self) -> PathBuf {
        self.storage_dir.join(PREFERENCES_DIRNAME)
    }

    /// Returns the directory of the sealed secure backend.
    #[must_use]
    pub fn secure_dir(&self) -> PathBuf {
        self.storage_dir.join(SECURE_DIRNAME)
    }
}
