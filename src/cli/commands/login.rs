//! cli::commands::login
//!
//! Store a GitHub personal access token.
//!
//! # Design
//!
//! - The token comes from `--token` or a masked prompt
//! - It is checked against the API root before it is stored; the granted
//!   scopes come from the `X-OAuth-Scopes` response header
//! - A token without the `repo` scope is stored anyway, with a warning
//! - The token is NEVER printed
//!
//! The same flow runs when `backup` finds no stored token.
//!
//! # Example
//!
//! ```bash
//! # Interactive (prompts for token)
//! ghbackup login
//!
//! # Non-interactive
//! ghbackup login --token ghp_xxxx
//! ```

use anyhow::{Context as _, Result};
use async_trait::async_trait;

use super::{load_config, token_store};
use crate::auth::{has_required_scope, AuthError, Credential, LoginFlow, REQUIRED_SCOPE};
use crate::cli::Context;
use crate::forge::github::GitHubForge;
use crate::forge::Forge;
use crate::secrets::TokenStore;
use crate::ui::output::{self, Verbosity};
use crate::ui::prompts::{self, PromptError};

/// Page that creates a token with the scopes a backup needs.
pub const TOKEN_URL: &str =
    "https://github.com/settings/tokens/new?scopes=repo,read:org&description=GitHub%20Backup%20Tool";

/// Login flow that verifies a token against the API and stores it.
#[derive(Debug, Clone)]
pub struct InteractiveLogin {
    api_base: String,
    token: Option<String>,
    open_browser: bool,
    interactive: bool,
    verbosity: Verbosity,
}

impl InteractiveLogin {
    /// Create a flow verifying against `api_base`.
    ///
    /// Without a preset token and without [`interactive`](Self::interactive)
    /// the flow fails with [`AuthError::NotInteractive`].
    pub fn new(api_base: impl Into<String>, verbosity: Verbosity) -> Self {
        Self {
            api_base: api_base.into(),
            token: None,
            open_browser: false,
            interactive: false,
            verbosity,
        }
    }

    /// Use this token instead of prompting.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Open the token page in a browser before prompting.
    pub fn open_browser(mut self, open: bool) -> Self {
        self.open_browser = open;
        self
    }

    /// Allow prompting.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    fn prompt(&self) -> Result<String, AuthError> {
        if !self.interactive {
            return Err(AuthError::NotInteractive);
        }

        output::print(
            "Create a GitHub Personal Access Token and paste it below. You can create one at this link",
            self.verbosity,
        );
        output::print(TOKEN_URL, self.verbosity);

        if self.open_browser {
            if let Err(e) = open::that(TOKEN_URL) {
                tracing::warn!(error = %e, "could not open a browser");
            }
        }

        prompts::password("Enter your GitHub token: ", true).map_err(|e| match e {
            PromptError::Cancelled => AuthError::Cancelled,
            PromptError::NotInteractive => AuthError::NotInteractive,
            PromptError::IoError(message) => AuthError::Io(message),
        })
    }
}

#[async_trait]
impl LoginFlow for InteractiveLogin {
    async fn login(&self, store: &dyn TokenStore) -> Result<(), AuthError> {
        let token = match &self.token {
            Some(token) => token.trim().to_string(),
            None => self.prompt()?,
        };
        let credential = Credential::new(&token)?;

        let forge = GitHubForge::with_api_base(credential.clone(), self.api_base.as_str())
            .map_err(|e| AuthError::Verification(e.to_string()))?;
        let scopes = forge
            .token_scopes()
            .await
            .map_err(|e| AuthError::Verification(e.to_string()))?;
        tracing::debug!(scopes = ?scopes, "token verified");

        if !has_required_scope(&scopes) {
            output::warn(
                format!(
                    "Token missing ({}) permissions; private repositories will not be backed up.",
                    REQUIRED_SCOPE
                ),
                self.verbosity,
            );
        }

        store.save(credential.expose())?;
        Ok(())
    }
}

/// Run the login command.
///
/// # Security
///
/// This function NEVER prints the token value. It only confirms success/failure.
pub fn login(ctx: &Context, token: Option<String>, open: bool) -> Result<()> {
    let config = load_config(ctx)?;
    let store = token_store(&config)?;

    let flow = InteractiveLogin::new(config.api_base(), ctx.verbosity)
        .with_token(token)
        .open_browser(open)
        .interactive(ctx.interactive);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(flow.login(&store)).context("Login failed")?;

    output::print(
        format!("Token stored in {}.", store.path().display()),
        ctx.verbosity,
    );
    Ok(())
}
