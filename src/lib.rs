//! ghbackup - Back up every branch of every GitHub repository an account can access
//!
//! ghbackup lists the repositories visible to a personal access token,
//! resolves their branches, records every `(repository, branch)` reference
//! in a manifest that never forgets, and downloads an archive of each branch.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Discovery and download pipeline
//! - [`core`] - Domain types, manifest, paths, lock, configuration
//! - [`forge`] - Abstraction over the remote hosting API (GitHub)
//! - [`auth`] - Bearer credential and login flow
//! - [`secrets`] - Token storage
//! - [`ui`] - Output, logging, progress, prompts
//!
//! # On-disk layout
//!
//! ```text
//! <backup_root>/
//!   gh_repos                         every reference ever discovered
//!   data/<owner>/<name>-<branch>.tar.gz
//!   .lock
//! ```

pub mod auth;
pub mod cli;
pub mod core;
pub mod engine;
pub mod forge;
pub mod secrets;
pub mod ui;
