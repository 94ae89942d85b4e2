//! backup command - Run the discovery-and-download pipeline

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::{load_config, token_store, InteractiveLogin};
use crate::auth::{obtain_credential, AuthError, LoginFlow};
use crate::cli::Context;
use crate::engine::{run_backup, BackupOptions};
use crate::forge::github::GitHubForge;
use crate::ui::output;

/// Back up every accessible repository into `dir` (or the configured root).
///
/// Runs the login flow first when no token is stored and prompting is
/// allowed.
pub fn backup(ctx: &Context, dir: Option<PathBuf>) -> Result<()> {
    let config = load_config(ctx)?;
    let options =
        BackupOptions::from_config(&config, dir).context("Cannot determine the backup root")?;
    let store = token_store(&config)?;
    let store_location = store.path().display().to_string();

    let flow = InteractiveLogin::new(config.api_base(), ctx.verbosity).interactive(ctx.interactive);
    let login: Option<&dyn LoginFlow> = if ctx.interactive { Some(&flow) } else { None };

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async {
        let credential = obtain_credential(&store, login, &store_location)
            .await
            .map_err(login_hint)?;
        let forge = GitHubForge::with_api_base(credential, config.api_base())
            .context("Failed to create GitHub client")?;

        run_backup(Arc::new(forge), &options)
            .await
            .with_context(|| format!("Backup into {} failed", options.root.display()))
    })?;

    tracing::info!(
        repositories = report.repositories,
        written = report.written,
        skipped = report.skipped,
        "Backed up all user repositories"
    );
    output::print(
        format!(
            "Backed up {} of {} branches from {} repositories into {}.",
            report.written,
            report.references,
            report.repositories,
            options.root.display()
        ),
        ctx.verbosity,
    );
    if report.skipped > 0 {
        output::warn(
            format!(
                "{} branch archives could not be downloaded; see the log above.",
                report.skipped
            ),
            ctx.verbosity,
        );
    }

    Ok(())
}

/// Point the user at `ghbackup login` when that would resolve `err`.
fn login_hint(err: AuthError) -> anyhow::Error {
    if err.needs_login() {
        anyhow::Error::new(err).context("Not logged in to GitHub; run 'ghbackup login' first")
    } else {
        err.into()
    }
}
