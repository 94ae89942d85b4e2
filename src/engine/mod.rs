//! engine
//!
//! The discovery-and-download pipeline.
//!
//! # Architecture
//!
//! ```text
//! Lock -> Discover (list + resolve, page by page) -> Manifest merge -> Download
//! ```
//!
//! - [`discover`] - Paginated lister and concurrent branch resolver
//! - [`download`] - Bounded-concurrency archive downloader
//!
//! [`run_backup`] is the single entry point. Every component below it
//! returns a [`BackupError`] instead of terminating the process; the CLI
//! decides how a failure is reported.
//!
//! # Invariants
//!
//! - Nothing is persisted unless discovery completed without error
//! - The manifest is rewritten before any download starts
//! - A refused archive never aborts the run; a broken stream always does
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ghbackup::engine::{run_backup, BackupOptions};
//!
//! let options = BackupOptions::from_config(&config, None)?;
//! let report = run_backup(Arc::new(forge), &options).await?;
//! println!("{} archives written", report.written);
//! ```

pub mod discover;
pub mod download;

pub use discover::{discover_repositories, resolve_branches, resolve_page, RepositoryLister};
pub use download::{plan_downloads, ArchiveDownloader, DownloadSummary, TaskOutcome};

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::core::config::{Config, ConfigError};
use crate::core::lock::{BackupLock, LockError};
use crate::core::manifest::{Manifest, ManifestError};
use crate::core::paths::BackupPaths;
use crate::core::types::{reference_lines, ArchiveFormat};
use crate::forge::{Forge, ForgeError};

/// Errors that end a backup run.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Another run holds the backup root.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// The manifest could not be read or rewritten.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A repository listing page could not be fetched.
    #[error("failed to list repositories (page {page}): {source}")]
    ListRepositories {
        page: u32,
        #[source]
        source: ForgeError,
    },

    /// A repository's branches could not be fetched.
    #[error("failed to list branches of {full_name}: {source}")]
    ResolveBranches {
        full_name: String,
        #[source]
        source: ForgeError,
    },

    /// The archive request itself failed (transport, redirects).
    #[error("failed to request archive of {full_name}@{branch}: {source}")]
    FetchArchive {
        full_name: String,
        branch: String,
        #[source]
        source: ForgeError,
    },

    /// An accepted archive broke off while streaming.
    #[error("archive of {full_name}@{branch} failed mid-stream: {source}")]
    Stream {
        full_name: String,
        branch: String,
        #[source]
        source: ForgeError,
    },

    /// A filesystem operation under the backup root failed.
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A worker task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    TaskFailed(String),
}

/// Settings for one backup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOptions {
    /// Backup root directory
    pub root: PathBuf,
    /// Repositories requested per listing page
    pub per_page: u32,
    /// Download slots
    pub concurrency: usize,
    /// Host used in manifest references
    pub web_host: String,
    /// Archive flavour to download
    pub archive_format: ArchiveFormat,
}

impl BackupOptions {
    /// Resolve options from configuration, with an optional root override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] when no root is given or
    /// configured and the home directory is unknown.
    pub fn from_config(config: &Config, root: Option<PathBuf>) -> Result<Self, ConfigError> {
        let root = match root {
            Some(root) => root,
            None => config.backup_root()?,
        };

        Ok(Self {
            root,
            per_page: config.per_page(),
            concurrency: config.concurrency(),
            web_host: config.web_host().to_string(),
            archive_format: config.archive_format(),
        })
    }
}

/// What a completed run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupReport {
    /// Repositories discovered
    pub repositories: usize,
    /// Branch references discovered (one download task each)
    pub references: usize,
    /// Archives written
    pub written: usize,
    /// Archives the forge refused
    pub skipped: usize,
    /// Download tasks the progress counter saw finish
    pub progressed: usize,
}

/// Run the full pipeline against `options.root`.
///
/// # Errors
///
/// Any error from discovery, the manifest, or a fatal download failure.
/// Refused archives are counted in the report, not returned as errors.
pub async fn run_backup(
    forge: Arc<dyn Forge>,
    options: &BackupOptions,
) -> Result<BackupReport, BackupError> {
    let paths = BackupPaths::new(&options.root);
    let _lock = BackupLock::acquire(&paths)?;

    tracing::info!("Fetching user repositories...");
    let descriptors = discover_repositories(Arc::clone(&forge), options.per_page).await?;

    paths.ensure_dirs().map_err(|source| BackupError::Io {
        path: paths.root().to_path_buf(),
        source,
    })?;

    let discovered = reference_lines(&descriptors, &options.web_host);
    let mut manifest = Manifest::open(paths.manifest_path())?;
    let total = manifest.merge_and_persist(&discovered)?.len();
    tracing::info!(
        discovered = discovered.len(),
        total,
        "User repositories grabbed and recorded in gh_repos"
    );

    let repositories = descriptors.len();
    let tasks = plan_downloads(descriptors, &paths, options.archive_format);
    let references = tasks.len();

    tracing::info!(archives = references, "Downloading repositories and backing up data");
    let downloader = ArchiveDownloader::new(forge, options.concurrency, options.archive_format);
    let summary = downloader.download_all(tasks).await?;

    Ok(BackupReport {
        repositories,
        references,
        written: summary.written,
        skipped: summary.skipped,
        progressed: summary.progressed,
    })
}
