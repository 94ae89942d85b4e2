//! secrets
//!
//! Storage for the bearer token used against the forge API.
//!
//! # Architecture
//!
//! The token is stored through the [`TokenStore`] trait. The only
//! implementation is [`FileTokenStore`], a single file holding the raw
//! token (`~/.ghbackup/.auth` unless configured otherwise).
//!
//! # Security
//!
//! - The token is **never** logged or included in error messages
//! - The file uses 0600 permissions on Unix (owner read/write only)
//! - All writes are atomic (temp file + rename)

mod file_store;
mod traits;

pub use file_store::FileTokenStore;
pub use traits::{SecretError, TokenStore};
