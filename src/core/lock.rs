//! core::lock
//!
//! Exclusive lock on a backup root.
//!
//! Two runs against the same root would race on the manifest and on
//! archive target paths, so a run holds `<backup_root>/.lock` for its
//! whole duration.
//!
//! # Invariants
//!
//! - Lock acquisition is non-blocking (fails fast if locked)
//! - Lock is automatically released on drop (RAII pattern)
//!
//! # Example
//!
//! ```ignore
//! use ghbackup::core::lock::BackupLock;
//! use ghbackup::core::paths::BackupPaths;
//!
//! let paths = BackupPaths::new("/backups");
//! let lock = BackupLock::acquire(&paths)?;
//! // ... run the backup ...
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::BackupPaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("backup root is locked by another ghbackup process")]
    AlreadyLocked,

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on a backup root.
///
/// Released when this guard is dropped.
#[derive(Debug)]
pub struct BackupLock {
    path: PathBuf,
    /// Some while the lock is held.
    file: Option<File>,
}

impl BackupLock {
    /// Attempt to acquire the lock for `paths`.
    ///
    /// Uses OS-level file locking via `fs2`, which works across processes.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(paths: &BackupPaths) -> Result<Self, LockError> {
        fs::create_dir_all(paths.root()).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", paths.root().display(), e))
        })?;

        let path = paths.lock_path();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Check if the lock is currently held.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock before the guard goes out of scope.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            FileExt::unlock(&file).map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for BackupLock {
    fn drop(&mut self) {
        // Best-effort release on drop
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
        }
    }
}
