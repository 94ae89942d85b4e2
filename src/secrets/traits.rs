//! secrets::traits
//!
//! Token storage trait definition.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include the token in error messages
//! - Be thread-safe (Send + Sync)

use thiserror::Error;

/// Errors from token storage operations.
///
/// Note: Error messages intentionally do not include the token.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to read from token storage.
    #[error("failed to read token: {0}")]
    ReadError(String),

    /// Failed to write to token storage.
    #[error("failed to write token: {0}")]
    WriteError(String),

    /// Failed to delete from token storage.
    #[error("failed to delete token: {0}")]
    DeleteError(String),
}

/// Storage for a single bearer token.
///
/// # Example
///
/// ```ignore
/// use ghbackup::secrets::{FileTokenStore, TokenStore};
///
/// let store = FileTokenStore::with_path("/home/me/.ghbackup/.auth".into());
/// store.save("ghp_xxxxx...")?;
///
/// match store.load()? {
///     Some(_) => println!("Token found (not printing value!)"),
///     None => println!("No token stored"),
/// }
/// ```
pub trait TokenStore: Send + Sync {
    /// Load the stored token.
    ///
    /// Returns `Ok(None)` if nothing usable is stored (missing or blank).
    fn load(&self) -> Result<Option<String>, SecretError>;

    /// Store a token, replacing any previous one.
    fn save(&self, token: &str) -> Result<(), SecretError>;

    /// Remove the stored token. Succeeds if nothing was stored.
    fn clear(&self) -> Result<(), SecretError>;

    /// Check if a token is stored.
    fn exists(&self) -> Result<bool, SecretError> {
        Ok(self.load()?.is_some())
    }
}
