//! forge::traits
//!
//! Forge trait definition for the remote hosting API.
//!
//! # Design
//!
//! The `Forge` trait is async because every operation is network I/O.
//! The API is treated as a black box: a paginated repository listing, a
//! branch listing per repository, and an archive endpoint per branch.
//!
//! An archive that the forge refuses (any status other than 200) is not an
//! error at this layer. It comes back as [`ArchiveResponse::Unavailable`]
//! so the caller can skip that branch and carry on. Transport failures are
//! errors.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use thiserror::Error;

use crate::core::types::{ArchiveFormat, RepositoryDescriptor};

/// Errors from forge operations.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Request URL
        url: String,
        /// Decoder message
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// A redirect chain exceeded the hop limit.
    #[error("too many redirects starting at {0}")]
    TooManyRedirects(String),

    /// A URL (configured or from a `Location` header) could not be used.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Archive bytes as they arrive from the network.
pub type ArchiveStream = Pin<Box<dyn Stream<Item = Result<Bytes, ForgeError>> + Send>>;

/// Outcome of an archive request that reached the forge.
pub enum ArchiveResponse {
    /// Status 200; the body streams the archive.
    Ready(ArchiveStream),

    /// Any other final status; the body is diagnostic text.
    Unavailable {
        /// URL of the original request
        url: String,
        /// Final HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
}

impl fmt::Debug for ArchiveResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveResponse::Ready(_) => f.write_str("Ready(<stream>)"),
            ArchiveResponse::Unavailable { url, status, body } => f
                .debug_struct("Unavailable")
                .field("url", url)
                .field("status", status)
                .field("body", body)
                .finish(),
        }
    }
}

/// The Forge trait for talking to the remote hosting API.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: branch resolution and archive
/// downloads run as concurrent tasks sharing one forge.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Short name of the forge (e.g., "github").
    fn name(&self) -> &'static str;

    /// Fetch one page (1-based) of repositories the account can access.
    ///
    /// Descriptors come back with no branches resolved. A page shorter
    /// than `per_page` is the last one.
    async fn list_repositories(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RepositoryDescriptor>, ForgeError>;

    /// List every branch name of a repository, in API order.
    async fn list_branches(&self, full_name: &str) -> Result<Vec<String>, ForgeError>;

    /// Request the archive of one branch.
    ///
    /// Redirects are followed with the original request headers.
    async fn fetch_archive(
        &self,
        full_name: &str,
        branch: &str,
        format: ArchiveFormat,
    ) -> Result<ArchiveResponse, ForgeError>;

    /// Scopes granted to the current token.
    async fn token_scopes(&self) -> Result<Vec<String>, ForgeError>;
}
