//! cli
//!
//! Command-line interface layer for ghbackup.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Initialize logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! handlers that build the collaborators (config, token store, forge) and
//! hand them to [`crate::engine`]. This is the only layer that uses
//! `anyhow`.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use std::path::PathBuf;

use anyhow::Result;

use crate::ui::output::{self, Verbosity};

/// Execution context derived from global flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit config file.
    pub config: Option<PathBuf>,
    /// Output verbosity.
    pub verbosity: Verbosity,
    /// Whether prompts may be shown.
    pub interactive: bool,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        config: cli.config.clone(),
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
        interactive: cli.interactive(),
    };

    output::init_logging(ctx.verbosity);

    let command = cli.command.unwrap_or(Command::Backup { dir: None });
    commands::dispatch(command, &ctx)
}
