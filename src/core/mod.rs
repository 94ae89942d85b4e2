//! core
//!
//! Domain types, on-disk layout, and persistence for ghbackup.
//!
//! # Modules
//!
//! - [`types`] - Repository descriptors, references, download tasks
//! - [`paths`] - Centralized path routing under the backup root
//! - [`manifest`] - The append-preserving `gh_repos` reference list
//! - [`lock`] - Exclusive lock held for a whole run
//! - [`config`] - Configuration schema and loading
//!
//! Nothing in this module performs network I/O.

pub mod config;
pub mod lock;
pub mod manifest;
pub mod paths;
pub mod types;
