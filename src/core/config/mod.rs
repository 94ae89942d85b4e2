//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI arguments (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$GHBACKUP_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/ghbackup/config.toml`
//! 3. `~/.ghbackup/config.toml`
//!
//! A missing file is not an error; defaults are used.
//!
//! # Example
//!
//! ```no_run
//! use ghbackup::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("Backing up into {}", config.backup_root().unwrap().display());
//! println!("Concurrency: {}", config.concurrency());
//! ```

pub mod schema;

pub use schema::GlobalConfig;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::types::ArchiveFormat;

/// Default page size for the repository listing.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Default number of simultaneous archive downloads.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Default REST API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default host for manifest references.
pub const DEFAULT_WEB_HOST: &str = "github.com";

/// Directory under `$HOME` used for the default backup root.
pub const HOME_DIR_NAME: &str = ".ghbackup";

/// Token file name under the home directory.
pub const CREDENTIAL_FILE: &str = ".auth";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Values from the config file
    pub global: GlobalConfig,
    /// Path to the config file (if loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// holds invalid values.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds
    /// invalid values.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let global = Self::read_config(path)?;
        global.validate()?;
        Ok(Self {
            global,
            path: Some(path.to_path_buf()),
        })
    }

    /// Configuration from in-memory values, validated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn from_global(global: GlobalConfig) -> Result<Self, ConfigError> {
        global.validate()?;
        Ok(Self { global, path: None })
    }

    /// Locate the first existing config file.
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check $GHBACKUP_CONFIG
        if let Ok(path) = std::env::var("GHBACKUP_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/ghbackup/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("ghbackup/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.ghbackup/config.toml
        let path = dirs::home_dir()?.join(HOME_DIR_NAME).join("config.toml");
        path.exists().then_some(path)
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<GlobalConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Path of the loaded config file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Backup root directory.
    ///
    /// Defaults to `~/.ghbackup`.
    pub fn backup_root(&self) -> Result<PathBuf, ConfigError> {
        match &self.global.backup_root {
            Some(root) => Ok(root.clone()),
            None => Ok(Self::home_state_dir()?),
        }
    }

    /// Token file location.
    ///
    /// Defaults to `~/.ghbackup/.auth`.
    pub fn credential_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.global.credential_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::home_state_dir()?.join(CREDENTIAL_FILE)),
        }
    }

    /// Repositories requested per listing page.
    pub fn per_page(&self) -> u32 {
        self.global.per_page.unwrap_or(DEFAULT_PER_PAGE)
    }

    /// Maximum simultaneous archive downloads.
    pub fn concurrency(&self) -> usize {
        self.global.concurrency.unwrap_or(DEFAULT_CONCURRENCY)
    }

    /// REST API base URL, without trailing slash.
    pub fn api_base(&self) -> &str {
        self.global
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
    }

    /// Host used in manifest references.
    pub fn web_host(&self) -> &str {
        self.global.web_host.as_deref().unwrap_or(DEFAULT_WEB_HOST)
    }

    /// Archive flavour to download.
    pub fn archive_format(&self) -> ArchiveFormat {
        self.global.archive_format.unwrap_or_default()
    }

    fn home_state_dir() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(HOME_DIR_NAME))
    }
}
