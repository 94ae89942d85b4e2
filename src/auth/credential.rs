//! auth::credential
//!
//! The bearer credential sent with every API request.

use std::fmt;
use std::sync::Arc;

use super::errors::AuthError;

/// Scope a personal access token needs to read private repositories.
pub const REQUIRED_SCOPE: &str = "repo";

/// An immutable bearer credential.
///
/// Constructed once per run and passed to every component that talks to
/// the forge. Cloning is cheap and shares the same token.
///
/// # Security
///
/// `Debug` never shows the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: Arc<str>,
}

impl Credential {
    /// Wrap a token after basic format checks.
    ///
    /// The token is not checked against the API here; that needs network
    /// access and happens during login.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for empty, very short, or
    /// whitespace-containing tokens.
    pub fn new(token: impl AsRef<str>) -> Result<Self, AuthError> {
        let token = token.as_ref();

        if token.is_empty() {
            return Err(AuthError::InvalidToken("token cannot be empty".into()));
        }

        if token.len() < 10 {
            return Err(AuthError::InvalidToken("token appears to be too short".into()));
        }

        if token.chars().any(char::is_whitespace) {
            return Err(AuthError::InvalidToken(
                "token should not contain whitespace".into(),
            ));
        }

        Ok(Self {
            token: Arc::from(token),
        })
    }

    /// Value for the `Authorization` header.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// The raw token, for persisting. Do not log it.
    pub fn expose(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Check a scope list (from `X-OAuth-Scopes`) for [`REQUIRED_SCOPE`].
pub fn has_required_scope(scopes: &[String]) -> bool {
    scopes.iter().any(|scope| scope == REQUIRED_SCOPE)
}
