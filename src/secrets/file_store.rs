//! secrets::file_store
//!
//! File-based token storage.
//!
//! # Security
//!
//! - The file holds exactly the raw token, nothing else
//! - File permissions are set to 0600 on Unix (owner read/write only)
//! - All writes are atomic (write to temp file, then rename)
//! - The token is NEVER logged, printed, or included in error messages

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use tracing::warn;

use super::traits::{SecretError, TokenStore};

/// File-based token storage, `~/.ghbackup/.auth` by default.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a token store at `path`.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path to the token file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Verify file permissions are correct (Unix only).
    ///
    /// Returns true if the file doesn't exist or has 0600 permissions.
    #[cfg(unix)]
    pub fn verify_permissions(&self) -> Result<bool, SecretError> {
        if !self.path.exists() {
            return Ok(true);
        }

        let metadata = fs::metadata(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read file metadata: {}", e)))?;

        let mode = metadata.permissions().mode() & 0o777;
        Ok(mode == 0o600)
    }

    /// Verify file permissions are correct (non-Unix always returns true).
    #[cfg(not(unix))]
    pub fn verify_permissions(&self) -> Result<bool, SecretError> {
        Ok(true)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, SecretError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SecretError::ReadError(format!(
                    "cannot read token file: {}",
                    e
                )))
            }
        };

        if !self.verify_permissions().unwrap_or(true) {
            warn!(
                path = %self.path.display(),
                "token file is readable by other users; expected mode 0600"
            );
        }

        let token = content.trim();
        if token.is_empty() {
            Ok(None)
        } else {
            Ok(Some(token.to_string()))
        }
    }

    fn save(&self, token: &str) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SecretError::WriteError(format!("cannot create directory: {}", e)))?;
        }

        let temp_path = self.path.with_extension("tmp");

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| SecretError::WriteError(format!("cannot create temp file: {}", e)))?;

            // Restrict permissions before the token touches the disk
            #[cfg(unix)]
            {
                let permissions = fs::Permissions::from_mode(0o600);
                file.set_permissions(permissions).map_err(|e| {
                    SecretError::WriteError(format!("cannot set permissions: {}", e))
                })?;
            }

            file.write_all(token.as_bytes())
                .map_err(|e| SecretError::WriteError(format!("cannot write token: {}", e)))?;

            file.sync_all()
                .map_err(|e| SecretError::WriteError(format!("cannot sync to disk: {}", e)))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| SecretError::WriteError(format!("cannot rename temp file: {}", e)))?;

        Ok(())
    }

    fn clear(&self) -> Result<(), SecretError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SecretError::DeleteError(format!(
                "cannot remove token file: {}",
                e
            ))),
        }
    }
}
