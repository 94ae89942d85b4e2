//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Location
//!
//! Searched in order of precedence:
//! 1. `$GHBACKUP_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/ghbackup/config.toml`
//! 3. `~/.ghbackup/config.toml`
//!
//! # Validation
//!
//! Values are validated after parsing so a bad file fails the run before
//! any network traffic.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::ArchiveFormat;

/// Largest page size the listing API accepts.
pub const MAX_PER_PAGE: u32 = 100;

/// Backup configuration file.
///
/// # Example
///
/// ```toml
/// backup_root = "/srv/backups/github"
/// per_page = 50
/// concurrency = 4
/// archive_format = "zipball"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Directory receiving the manifest and archives
    pub backup_root: Option<PathBuf>,

    /// Repositories requested per listing page
    pub per_page: Option<u32>,

    /// Maximum simultaneous archive downloads
    pub concurrency: Option<usize>,

    /// REST API base URL (GitHub Enterprise: `https://host/api/v3`)
    pub api_base: Option<String>,

    /// Host used in manifest references
    pub web_host: Option<String>,

    /// Archive flavour to download
    pub archive_format: Option<ArchiveFormat>,

    /// File holding the bearer token
    pub credential_path: Option<PathBuf>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(per_page) = self.per_page {
            if per_page == 0 || per_page > MAX_PER_PAGE {
                return Err(ConfigError::InvalidValue(format!(
                    "per_page must be between 1 and {}, got {}",
                    MAX_PER_PAGE, per_page
                )));
            }
        }

        if self.concurrency == Some(0) {
            return Err(ConfigError::InvalidValue(
                "concurrency must be at least 1".to_string(),
            ));
        }

        if let Some(api_base) = &self.api_base {
            if !(api_base.starts_with("https://") || api_base.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "api_base must be an http(s) URL, got '{}'",
                    api_base
                )));
            }
        }

        if let Some(host) = &self.web_host {
            if host.is_empty() || host.contains('/') {
                return Err(ConfigError::InvalidValue(format!(
                    "web_host must be a bare host name, got '{}'",
                    host
                )));
            }
        }

        Ok(())
    }
}
