//! auth::errors
//!
//! Authentication error types.
//!
//! Error messages MUST NOT contain tokens.
//!
//! # Example
//!
//! ```
//! use ghbackup::auth::AuthError;
//!
//! let err = AuthError::NotAuthenticated("/home/me/.ghbackup/.auth".to_string());
//! assert!(err.to_string().contains("ghbackup login"));
//! ```

use thiserror::Error;

/// Errors from authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token is stored and none could be obtained.
    #[error("no token stored at '{0}'. Run 'ghbackup login'.")]
    NotAuthenticated(String),

    /// The supplied token failed basic format checks.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The user cancelled the login prompt.
    #[error("login cancelled by user")]
    Cancelled,

    /// Login needs a prompt but the session is not interactive.
    #[error("token required. Use 'ghbackup login --token <TOKEN>' or run interactively.")]
    NotInteractive,

    /// Error from token storage.
    #[error("token store error: {0}")]
    SecretStore(String),

    /// Verifying the token against the API failed.
    #[error("token verification failed: {0}")]
    Verification(String),

    /// Reading the token from the terminal failed.
    #[error("cannot read token: {0}")]
    Io(String),
}

impl AuthError {
    /// Check if this error can be resolved by running `ghbackup login`.
    pub fn needs_login(&self) -> bool {
        matches!(
            self,
            AuthError::NotAuthenticated(_) | AuthError::Cancelled | AuthError::NotInteractive
        )
    }
}

impl From<crate::secrets::SecretError> for AuthError {
    fn from(err: crate::secrets::SecretError) -> Self {
        AuthError::SecretStore(err.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::Io(err.to_string())
    }
}
