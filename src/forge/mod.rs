//! forge
//!
//! Abstraction over the remote hosting API.
//!
//! # Architecture
//!
//! The pipeline talks to the forge only through the [`Forge`] trait, so the
//! lister, branch resolver, and downloader run unchanged against
//! [`github::GitHubForge`] in production and [`mock::MockForge`] in tests.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait, errors, and archive response types
//! - [`github`]: GitHub REST implementation
//! - [`mock`]: In-memory implementation for deterministic testing
//!
//! # Example
//!
//! ```ignore
//! use ghbackup::forge::github::GitHubForge;
//! use ghbackup::forge::{ArchiveResponse, Forge};
//!
//! let forge = GitHubForge::new(credential)?;
//! match forge.fetch_archive("octocat/hello-world", "main", format).await? {
//!     ArchiveResponse::Ready(stream) => { /* write it */ }
//!     ArchiveResponse::Unavailable { status, .. } => println!("skipped: {}", status),
//! }
//! ```

pub mod github;
pub mod mock;
mod traits;

pub use traits::*;
