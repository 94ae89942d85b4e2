//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge serves repositories, branches, and archives from memory.
//! Repositories are paged by slicing the configured list, so a page shorter
//! than `per_page` (or an empty one) ends the listing exactly as the real
//! API does. Failures can be injected per operation, and concurrent archive
//! downloads are counted so tests can assert the in-flight ceiling. A
//! download counts as in flight from the request until its body stream is
//! dropped.
//!
//! # Example
//!
//! ```
//! use ghbackup::core::types::RepositoryDescriptor;
//! use ghbackup::forge::mock::MockForge;
//! use ghbackup::forge::Forge;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let forge = MockForge::new()
//!     .with_repository(RepositoryDescriptor::new("hello", "octocat", "octocat/hello"))
//!     .with_branches("octocat/hello", &["main", "dev"]);
//!
//! let page = forge.list_repositories(1, 20).await.unwrap();
//! assert_eq!(page.len(), 1);
//!
//! let branches = forge.list_branches("octocat/hello").await.unwrap();
//! assert_eq!(branches, vec!["main", "dev"]);
//! # });
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use super::traits::{ArchiveResponse, ArchiveStream, Forge, ForgeError};
use crate::core::types::{ArchiveFormat, RepositoryDescriptor};

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping. Clones share state.
#[derive(Debug, Clone)]
pub struct MockForge {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
    /// Archive downloads currently in progress.
    in_flight: Arc<AtomicUsize>,
    /// Highest value `in_flight` has reached.
    max_in_flight: Arc<AtomicUsize>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockForgeInner {
    /// Every repository, in listing order.
    repositories: Vec<RepositoryDescriptor>,
    /// Branch names by repository full name.
    branches: HashMap<String, Vec<String>>,
    /// Archive behaviour by (full name, branch). Missing entries serve a
    /// small body naming the branch.
    archives: HashMap<(String, String), MockArchive>,
    /// Scopes reported for the token.
    scopes: Vec<String>,
    /// Pause before each chunk of an archive body.
    archive_delay: Option<Duration>,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configured response for one archive.
#[derive(Debug, Clone)]
pub enum MockArchive {
    /// Status 200 with this body.
    Bytes(Vec<u8>),
    /// A non-200 final status with a diagnostic body.
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
    /// Status 200 whose body fails after the first chunk.
    BrokenStream,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail list_repositories for the given page.
    ListRepositories {
        /// 1-based page number
        page: u32,
        /// Error to return
        error: ForgeError,
    },
    /// Fail list_branches for the given repository.
    ListBranches {
        /// Repository full name
        full_name: String,
        /// Error to return
        error: ForgeError,
    },
    /// Fail fetch_archive for every request.
    FetchArchive(ForgeError),
    /// Fail token_scopes.
    TokenScopes(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    ListRepositories { page: u32, per_page: u32 },
    ListBranches { full_name: String },
    FetchArchive {
        full_name: String,
        branch: String,
        format: ArchiveFormat,
    },
    TokenScopes,
}

impl MockForge {
    /// Create a new empty mock forge.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockForgeInner::default())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockForgeInner> {
        // A panicking test thread must not hide state from the others.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a repository to the end of the listing.
    pub fn with_repository(self, repository: RepositoryDescriptor) -> Self {
        self.state().repositories.push(repository);
        self
    }

    /// Add `count` repositories named `repo-000`, `repo-001`, ... owned by
    /// `owner`, each with a single `main` branch.
    pub fn with_generated_repositories(self, owner: &str, count: usize) -> Self {
        {
            let mut inner = self.state();
            for i in 0..count {
                let name = format!("repo-{:03}", i);
                let full_name = format!("{}/{}", owner, name);
                inner
                    .branches
                    .insert(full_name.clone(), vec!["main".to_string()]);
                inner
                    .repositories
                    .push(RepositoryDescriptor::new(name, owner, full_name));
            }
        }
        self
    }

    /// Set the branches of a repository.
    pub fn with_branches(self, full_name: &str, branches: &[&str]) -> Self {
        self.state().branches.insert(
            full_name.to_string(),
            branches.iter().map(|b| b.to_string()).collect(),
        );
        self
    }

    /// Configure the archive served for one branch.
    pub fn with_archive(self, full_name: &str, branch: &str, archive: MockArchive) -> Self {
        self.state()
            .archives
            .insert((full_name.to_string(), branch.to_string()), archive);
        self
    }

    /// Set the scopes reported for the token.
    pub fn with_scopes(self, scopes: &[&str]) -> Self {
        self.state().scopes = scopes.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Pause for `delay` before yielding each chunk of an archive body.
    pub fn with_archive_delay(self, delay: Duration) -> Self {
        self.state().archive_delay = Some(delay);
        self
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on = Some(fail_on);
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Number of archive requests made.
    pub fn archive_requests(&self) -> usize {
        self.state()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::FetchArchive { .. }))
            .count()
    }

    /// Highest number of archive downloads that were in progress at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        self.state().operations.push(op);
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight counter when an archive download ends.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Archive body that stays counted as in flight until it is dropped.
struct TrackedArchive {
    body: ArchiveStream,
    _in_flight: InFlight,
}

impl Stream for TrackedArchive {
    type Item = Result<Bytes, ForgeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.body.as_mut().poll_next(cx)
    }
}

fn delayed_body(chunks: Vec<Result<Bytes, ForgeError>>, delay: Option<Duration>) -> ArchiveStream {
    Box::pin(futures_util::stream::iter(chunks).then(move |chunk| async move {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        chunk
    }))
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_repositories(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RepositoryDescriptor>, ForgeError> {
        self.record(MockOperation::ListRepositories { page, per_page });

        let inner = self.state();
        if let Some(FailOn::ListRepositories { page: p, error }) = &inner.fail_on {
            if *p == page {
                return Err(error.clone());
            }
        }

        let per_page = per_page as usize;
        let start = (page.saturating_sub(1) as usize).saturating_mul(per_page);
        Ok(inner
            .repositories
            .iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect())
    }

    async fn list_branches(&self, full_name: &str) -> Result<Vec<String>, ForgeError> {
        self.record(MockOperation::ListBranches {
            full_name: full_name.to_string(),
        });

        let inner = self.state();
        if let Some(FailOn::ListBranches {
            full_name: name,
            error,
        }) = &inner.fail_on
        {
            if name == full_name {
                return Err(error.clone());
            }
        }

        inner
            .branches
            .get(full_name)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("repository {}", full_name)))
    }

    async fn fetch_archive(
        &self,
        full_name: &str,
        branch: &str,
        format: ArchiveFormat,
    ) -> Result<ArchiveResponse, ForgeError> {
        self.record(MockOperation::FetchArchive {
            full_name: full_name.to_string(),
            branch: branch.to_string(),
            format,
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let in_flight = InFlight(Arc::clone(&self.in_flight));
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (delay, failure, archive) = {
            let inner = self.state();
            let failure = match &inner.fail_on {
                Some(FailOn::FetchArchive(error)) => Some(error.clone()),
                _ => None,
            };
            let archive = inner
                .archives
                .get(&(full_name.to_string(), branch.to_string()))
                .cloned();
            (inner.archive_delay, failure, archive)
        };

        if let Some(error) = failure {
            return Err(error);
        }

        let url = format!(
            "https://api.mock/repos/{}/{}/{}",
            full_name,
            format.endpoint(),
            branch
        );

        let chunks = match archive {
            None => vec![Ok(Bytes::from(format!("{}@{}", full_name, branch)))],
            Some(MockArchive::Bytes(bytes)) => vec![Ok(Bytes::from(bytes))],
            Some(MockArchive::Status { status, body }) => {
                return Ok(ArchiveResponse::Unavailable { url, status, body });
            }
            Some(MockArchive::BrokenStream) => vec![
                Ok(Bytes::from_static(b"partial")),
                Err(ForgeError::NetworkError("connection reset".into())),
            ],
        };

        Ok(ArchiveResponse::Ready(Box::pin(TrackedArchive {
            body: delayed_body(chunks, delay),
            _in_flight: in_flight,
        })))
    }

    async fn token_scopes(&self) -> Result<Vec<String>, ForgeError> {
        self.record(MockOperation::TokenScopes);

        let inner = self.state();
        if let Some(FailOn::TokenScopes(error)) = &inner.fail_on {
            return Err(error.clone());
        }
        Ok(inner.scopes.clone())
    }
}
