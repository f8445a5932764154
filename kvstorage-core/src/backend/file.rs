//! File system backend with atomic writes.
//!
//! Each key is stored in its own file inside the backend directory. Writes
//! follow the write-to-temp-then-rename sequence:
//!
//! 1. Write data to a temporary file in the same directory
//! 2. `fsync` the temporary file
//! 3. Atomically rename it over the target name
//! 4. `fsync` the directory so the rename is durable
//!
//! Readers therefore see either the old value or the new one, never a torn
//! write.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use sha2::{Digest, Sha256};

use super::Backend;
use crate::error::{StorageError, StorageResult};

/// Extension of committed entry files.
const ENTRY_EXTENSION: &str = "kv";

/// Extension of in-flight temporary files.
const TEMP_EXTENSION: &str = "tmp";

/// Directory-backed implementation of [`Backend`].
///
/// File names are the hex SHA-256 of the key, so any key string (including
/// the empty string, `/` or `..`) maps to a safe, fixed-length name. The
/// directory should be dedicated to this backend: [`Backend::clear`] removes
/// every entry file in it.
#[derive(Debug)]
pub struct FileBackend {
    directory: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    /// Opens a backend rooted at `directory`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(directory: P) -> StorageResult<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).map_err(|err| {
            StorageError::io(
                format!("creating backend directory '{}'", directory.display()),
                err,
            )
        })?;
        Ok(Self {
            directory,
            lock: Mutex::new(()),
        })
    }

    /// Returns the directory holding this backend's files.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn file_stem(key: &str) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.directory
            .join(format!("{}.{ENTRY_EXTENSION}", Self::file_stem(key)))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.directory
            .join(format!("{}.{TEMP_EXTENSION}", Self::file_stem(key)))
    }

    fn guard(&self) -> StorageResult<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| StorageError::poisoned("file backend"))
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> StorageResult<()> {
        File::open(&self.directory)
            .and_then(|dir| dir.sync_all())
            .map_err(|err| {
                StorageError::io(
                    format!("syncing directory '{}'", self.directory.display()),
                    err,
                )
            })
    }

    // Directories cannot be opened for syncing here; rename is still atomic
    // on the file systems we target.
    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps, clippy::unused_self)]
    fn sync_directory(&self) -> StorageResult<()> {
        Ok(())
    }

    fn remove_if_present(path: &Path) -> StorageResult<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::io(
                format!("removing '{}'", path.display()),
                err,
            )),
        }
    }
}

impl Backend for FileBackend {
    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let _guard = self.guard()?;
        let final_path = self.entry_path(key);
        let temp_path = self.temp_path(key);

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|err| {
                StorageError::io(
                    format!("creating temporary file '{}'", temp_path.display()),
                    err,
                )
            })?;
        file.write_all(value)
            .and_then(|()| file.sync_all())
            .map_err(|err| {
                StorageError::io(
                    format!("writing temporary file '{}'", temp_path.display()),
                    err,
                )
            })?;
        drop(file);

        fs::rename(&temp_path, &final_path).map_err(|err| {
            let _ = fs::remove_file(&temp_path);
            StorageError::io(
                format!(
                    "renaming '{}' to '{}'",
                    temp_path.display(),
                    final_path.display()
                ),
                err,
            )
        })?;

        self.sync_directory()
    }

    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let _guard = self.guard()?;
        let path = self.entry_path(key);
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::io(
                format!("reading '{}'", path.display()),
                err,
            )),
        }
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let _guard = self.guard()?;
        if Self::remove_if_present(&self.entry_path(key))? {
            self.sync_directory()?;
        }
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let _guard = self.guard()?;
        let entries = fs::read_dir(&self.directory).map_err(|err| {
            StorageError::io(
                format!("listing '{}'", self.directory.display()),
                err,
            )
        })?;

        let mut removed = false;
        for entry in entries {
            let path = entry
                .map_err(|err| StorageError::io("reading directory entry", err))?
                .path();
            let owned = path
                .extension()
                .is_some_and(|ext| ext == ENTRY_EXTENSION || ext == TEMP_EXTENSION);
            if owned && path.is_file() {
                removed |= Self::remove_if_present(&path)?;
            }
        }

        if removed {
            self.sync_directory()?;
        }
        Ok(())
    }

    fn contains(&self, key: &str) -> StorageResult<bool> {
        let _guard = self.guard()?;
        Ok(self.entry_path(key).is_file())
    }
}
