//! auth
//!
//! Bearer credential acquisition.
//!
//! # Architecture
//!
//! - [`Credential`] - Immutable token value handed to the forge
//! - [`LoginFlow`] - The collaborator that produces and stores a token
//! - [`obtain_credential`] - Stored token, or login then stored token
//!
//! The credential is read once per run and passed explicitly to every
//! component that needs it. Nothing here holds process-wide state.
//!
//! # Security
//!
//! Tokens never appear in logs, error messages, or debug output.
//!
//! # Example
//!
//! ```ignore
//! use ghbackup::auth::obtain_credential;
//! use ghbackup::secrets::FileTokenStore;
//!
//! let store = FileTokenStore::with_path(config.credential_path()?);
//! let credential = obtain_credential(&store, Some(&login), "~/.ghbackup/.auth").await?;
//! ```

mod credential;
mod errors;

pub use credential::{has_required_scope, Credential, REQUIRED_SCOPE};
pub use errors::AuthError;

use async_trait::async_trait;

use crate::secrets::TokenStore;

/// Produces a token and saves it to a [`TokenStore`].
#[async_trait]
pub trait LoginFlow: Send + Sync {
    /// Obtain a token from the user and save it to `store`.
    async fn login(&self, store: &dyn TokenStore) -> Result<(), AuthError>;
}

/// Read the stored credential, running `login` once if none is stored.
///
/// # Errors
///
/// - [`AuthError::NotAuthenticated`] if no token is stored and there is no
///   login flow, or the login flow stored nothing
/// - [`AuthError::InvalidToken`] if the stored token is malformed
/// - Any error from the login flow or the store
pub async fn obtain_credential(
    store: &dyn TokenStore,
    login: Option<&dyn LoginFlow>,
    store_location: &str,
) -> Result<Credential, AuthError> {
    if let Some(token) = store.load()? {
        return Credential::new(token);
    }

    let Some(login) = login else {
        return Err(AuthError::NotAuthenticated(store_location.to_string()));
    };

    tracing::info!("No stored token, starting login");
    login.login(store).await?;

    match store.load()? {
        Some(token) => Credential::new(token),
        None => Err(AuthError::NotAuthenticated(store_location.to_string())),
    }
}
