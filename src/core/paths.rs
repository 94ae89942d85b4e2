//! core::paths
//!
//! Centralized path routing for the backup root.
//!
//! # Storage Layout
//!
//! Everything a run touches lives under `<backup_root>/`:
//! - `gh_repos` - Manifest of every reference ever discovered
//! - `data/<owner>/<name>-<branch>.<ext>` - Branch archives
//! - `.lock` - Exclusive run lock
//!
//! **Hard rule:** no code outside this module joins these names onto the
//! root by hand. All paths go through [`BackupPaths`].
//!
//! # Example
//!
//! ```
//! use ghbackup::core::paths::BackupPaths;
//! use std::path::PathBuf;
//!
//! let paths = BackupPaths::new("/backups");
//! assert_eq!(paths.manifest_path(), PathBuf::from("/backups/gh_repos"));
//! ```

use std::path::{Path, PathBuf};

use crate::core::types::ArchiveFormat;

/// Manifest file name under the backup root.
pub const MANIFEST_FILE: &str = "gh_repos";

/// Archive directory name under the backup root.
pub const DATA_DIR: &str = "data";

/// Lock file name under the backup root.
pub const LOCK_FILE: &str = ".lock";

/// Path routing for one backup root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPaths {
    root: PathBuf,
}

impl BackupPaths {
    /// Create paths rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The backup root itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/gh_repos`
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// `<root>/.lock`
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// `<root>/data`
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    /// `<root>/data/<owner>`
    pub fn owner_dir(&self, owner_login: &str) -> PathBuf {
        self.data_dir().join(owner_login)
    }

    /// `<root>/data/<owner>/<name>-<branch>.<ext>`
    ///
    /// Branch names containing `/` produce nested directories below the
    /// owner directory.
    pub fn archive_path(
        &self,
        owner_login: &str,
        name: &str,
        branch: &str,
        format: ArchiveFormat,
    ) -> PathBuf {
        self.owner_dir(owner_login)
            .join(format!("{}-{}.{}", name, branch, format.extension()))
    }

    /// Create the root and `data/` directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an IO error if directory creation fails. An existing
    /// directory is not an error.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.data_dir())?;
        Ok(())
    }
}
