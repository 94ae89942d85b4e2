//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration
//! 2. Builds the collaborators the command needs
//! 3. Runs async work on a fresh tokio runtime
//! 4. Formats and displays output

mod backup;
mod completion;
mod login;
mod logout;

pub use backup::backup;
pub use completion::completion;
pub use login::{login, InteractiveLogin, TOKEN_URL};
pub use logout::logout;

use anyhow::{Context as _, Result};

use super::{Command, Context};
use crate::core::config::Config;
use crate::secrets::FileTokenStore;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Backup { dir } => backup(ctx, dir),
        Command::Login { token, open } => login(ctx, token, open),
        Command::Logout => logout(ctx),
        Command::Completion { shell } => completion(shell),
    }
}

/// Load configuration from `--config` or the default locations.
fn load_config(ctx: &Context) -> Result<Config> {
    match &ctx.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Config::load().context("Failed to load config"),
    }
}

/// Token store at the configured credential path.
fn token_store(config: &Config) -> Result<FileTokenStore> {
    let path = config
        .credential_path()
        .context("Cannot determine where the token is stored")?;
    Ok(FileTokenStore::with_path(path))
}
