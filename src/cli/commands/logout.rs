//! logout command - Delete the stored token

use anyhow::{Context as _, Result};

use super::{load_config, token_store};
use crate::cli::Context;
use crate::secrets::TokenStore;
use crate::ui::output;

/// Remove the stored token. Succeeds when none is stored.
pub fn logout(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    let store = token_store(&config)?;

    store.clear().context("Failed to remove stored token")?;

    output::print("Logged out.", ctx.verbosity);
    Ok(())
}
