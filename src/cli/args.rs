//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read configuration from this file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Warnings and errors only; never prompt

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::ui::prompts;

/// ghbackup - Back up every branch of every GitHub repository you can access
#[derive(Parser, Debug)]
#[command(name = "ghbackup")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
Running ghbackup with no command is the same as 'ghbackup backup'.

Your token is stored in ~/.ghbackup/.auth and ~/.ghbackup is the default
backup folder. Both can be changed in the config file.")]
pub struct Cli {
    /// Read configuration from this file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Warnings and errors only; never prompt
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Whether prompts may be shown.
    ///
    /// False under `--quiet` or when stdin is not a terminal.
    pub fn interactive(&self) -> bool {
        !self.quiet && prompts::is_interactive()
    }
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Back up every branch of every accessible repository
    #[command(after_help = "\
EXAMPLES:
    # Back up into the configured root (default ~/.ghbackup)
    ghbackup backup

    # Back up into another folder
    ghbackup backup /mnt/archive/github")]
    Backup {
        /// Backup root (overrides the configured one)
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Store a GitHub personal access token
    Login {
        /// Token value (prompted with masked input when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Open the token creation page in a browser
        #[arg(long)]
        open: bool,
    },

    /// Delete the stored token
    Logout,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("parse")
    }

    #[test]
    fn definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_command_parses() {
        let cli = parse(&["ghbackup"]);
        assert!(cli.command.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn backup_with_dir() {
        let cli = parse(&["ghbackup", "backup", "/tmp/out"]);
        assert_eq!(
            cli.command,
            Some(Command::Backup {
                dir: Some(PathBuf::from("/tmp/out"))
            })
        );
    }

    #[test]
    fn login_flags() {
        let cli = parse(&["ghbackup", "login", "--token", "ghp_abcdefghij", "--open"]);
        assert_eq!(
            cli.command,
            Some(Command::Login {
                token: Some("ghp_abcdefghij".into()),
                open: true
            })
        );
    }

    #[test]
    fn global_flags_after_command() {
        let cli = parse(&["ghbackup", "backup", "--debug", "--config", "/etc/gh.toml"]);
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/gh.toml")));
    }

    #[test]
    fn quiet_is_never_interactive() {
        let cli = parse(&["ghbackup", "-q"]);
        assert!(!cli.interactive());
    }

    #[test]
    fn completion_shell() {
        let cli = parse(&["ghbackup", "completion", "zsh"]);
        assert_eq!(cli.command, Some(Command::Completion { shell: Shell::Zsh }));
    }
}
