//! engine::discover
//!
//! Repository discovery: the paginated lister and the branch resolver.
//!
//! # Algorithm
//!
//! Pages are fetched strictly in order. For each page, one task per
//! repository resolves its branches; every task sends `(index, result)`
//! into a channel owned by the page loop. Once all tasks have been joined
//! the channel is drained, results are put back in listing order, and only
//! then is the next page requested.
//!
//! A page shorter than the requested size (including an empty page) is the
//! last one. Any listing or branch-resolution failure ends discovery with
//! an error; nothing partial is returned.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::BackupError;
use crate::core::types::RepositoryDescriptor;
use crate::forge::Forge;

/// Branches whose name contains this marker are never backed up.
pub const DISPOSABLE_BRANCH_MARKER: &str = "dependabot";

/// Drop disposable automation branches, keeping the rest in order.
///
/// The match is a case-sensitive substring test.
pub fn retain_backup_branches(branches: Vec<String>) -> Vec<String> {
    branches
        .into_iter()
        .filter(|name| !name.contains(DISPOSABLE_BRANCH_MARKER))
        .collect()
}

/// Pages through the repositories visible to the account.
pub struct RepositoryLister {
    forge: Arc<dyn Forge>,
    per_page: u32,
    next_page: u32,
    finished: bool,
}

impl RepositoryLister {
    /// Create a lister that requests `per_page` repositories at a time.
    pub fn new(forge: Arc<dyn Forge>, per_page: u32) -> Self {
        Self {
            forge,
            per_page,
            next_page: 1,
            finished: false,
        }
    }

    /// Fetch the next page.
    ///
    /// Returns `Ok(None)` once the listing is exhausted; no request is made
    /// after a short or empty page has been seen.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::ListRepositories`] on any forge failure.
    pub async fn next_page(&mut self) -> Result<Option<Vec<RepositoryDescriptor>>, BackupError> {
        if self.finished {
            return Ok(None);
        }

        let page = self.next_page;
        let descriptors = self
            .forge
            .list_repositories(page, self.per_page)
            .await
            .map_err(|source| BackupError::ListRepositories { page, source })?;

        tracing::debug!(page, count = descriptors.len(), "listed repositories");

        if descriptors.len() < self.per_page as usize {
            self.finished = true;
        } else {
            self.next_page += 1;
        }

        if descriptors.is_empty() {
            return Ok(None);
        }

        Ok(Some(descriptors))
    }
}

/// Fill in the branches of one repository.
///
/// # Errors
///
/// Returns [`BackupError::ResolveBranches`] on any forge failure.
pub async fn resolve_branches(
    forge: &dyn Forge,
    descriptor: RepositoryDescriptor,
) -> Result<RepositoryDescriptor, BackupError> {
    let branches = forge
        .list_branches(&descriptor.full_name)
        .await
        .map_err(|source| BackupError::ResolveBranches {
            full_name: descriptor.full_name.clone(),
            source,
        })?;

    let total = branches.len();
    let kept = retain_backup_branches(branches);
    tracing::debug!(
        repository = %descriptor.full_name,
        branches = kept.len(),
        dropped = total - kept.len(),
        "resolved branches"
    );

    Ok(descriptor.with_branches(kept))
}

/// Resolve every repository of one page concurrently.
///
/// Returns the descriptors in the order they were listed.
///
/// # Errors
///
/// Returns the first resolution error received, or
/// [`BackupError::TaskFailed`] if a task panicked.
pub async fn resolve_page(
    forge: Arc<dyn Forge>,
    page: Vec<RepositoryDescriptor>,
) -> Result<Vec<RepositoryDescriptor>, BackupError> {
    let count = page.len();
    // Sized so no sender ever waits; the receiver is drained after the join.
    let (tx, mut rx) = mpsc::channel(count.max(1));

    let mut handles = Vec::with_capacity(count);
    for (index, descriptor) in page.into_iter().enumerate() {
        let forge = Arc::clone(&forge);
        let tx = tx.clone();
        handles.push(tokio::spawn(async move {
            let result = resolve_branches(forge.as_ref(), descriptor).await;
            let _ = tx.send((index, result)).await;
        }));
    }
    drop(tx);

    for handle in handles {
        handle
            .await
            .map_err(|e| BackupError::TaskFailed(e.to_string()))?;
    }

    let mut resolved = Vec::with_capacity(count);
    while let Some((index, result)) = rx.recv().await {
        resolved.push((index, result?));
    }
    resolved.sort_by_key(|(index, _)| *index);

    Ok(resolved
        .into_iter()
        .map(|(_, descriptor)| descriptor)
        .collect())
}

/// List every repository and resolve its branches.
///
/// # Errors
///
/// Any listing or resolution error ends discovery.
pub async fn discover_repositories(
    forge: Arc<dyn Forge>,
    per_page: u32,
) -> Result<Vec<RepositoryDescriptor>, BackupError> {
    let mut lister = RepositoryLister::new(Arc::clone(&forge), per_page);
    let mut descriptors = Vec::new();

    while let Some(page) = lister.next_page().await? {
        let resolved = resolve_page(Arc::clone(&forge), page).await?;
        descriptors.extend(resolved);
    }

    tracing::info!(repositories = descriptors.len(), "discovery complete");
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{FailOn, MockForge, MockOperation};
    use crate::forge::ForgeError;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    mod branch_filter {
        use super::*;

        #[test]
        fn drops_dependabot_and_keeps_order() {
            let kept = retain_backup_branches(names(&[
                "main",
                "dependabot/npm_and_yarn/lodash-4.17.21",
                "feature/x",
                "my-dependabot-test",
                "release",
            ]));
            assert_eq!(kept, names(&["main", "feature/x", "release"]));
        }

        #[test]
        fn match_is_case_sensitive() {
            let kept = retain_backup_branches(names(&["Dependabot/x", "DEPENDABOT"]));
            assert_eq!(kept, names(&["Dependabot/x", "DEPENDABOT"]));
        }

        #[test]
        fn empty_input() {
            assert!(retain_backup_branches(Vec::new()).is_empty());
        }
    }

    mod lister {
        use super::*;

        fn list_calls(forge: &MockForge) -> usize {
            forge
                .operations()
                .iter()
                .filter(|op| matches!(op, MockOperation::ListRepositories { .. }))
                .count()
        }

        #[tokio::test]
        async fn stops_after_short_page() {
            let mock = MockForge::new().with_generated_repositories("octo", 5);
            let mut lister = RepositoryLister::new(Arc::new(mock.clone()), 2);

            assert_eq!(lister.next_page().await.unwrap().unwrap().len(), 2);
            assert_eq!(lister.next_page().await.unwrap().unwrap().len(), 2);
            assert_eq!(lister.next_page().await.unwrap().unwrap().len(), 1);
            assert!(lister.next_page().await.unwrap().is_none());
            assert!(lister.next_page().await.unwrap().is_none());

            assert_eq!(list_calls(&mock), 3);
        }

        #[tokio::test]
        async fn exact_full_page_needs_one_more_request() {
            let mock = MockForge::new().with_generated_repositories("octo", 4);
            let mut lister = RepositoryLister::new(Arc::new(mock.clone()), 2);

            assert!(lister.next_page().await.unwrap().is_some());
            assert!(lister.next_page().await.unwrap().is_some());
            assert!(lister.next_page().await.unwrap().is_none());
            assert!(lister.next_page().await.unwrap().is_none());

            assert_eq!(list_calls(&mock), 3);
        }

        #[tokio::test]
        async fn empty_account() {
            let mock = MockForge::new();
            let mut lister = RepositoryLister::new(Arc::new(mock.clone()), 20);

            assert!(lister.next_page().await.unwrap().is_none());
            assert_eq!(list_calls(&mock), 1);
        }

        #[tokio::test]
        async fn listing_error_is_reported_with_page() {
            let mock = MockForge::new()
                .with_generated_repositories("octo", 4)
                .fail_on(FailOn::ListRepositories {
                    page: 2,
                    error: ForgeError::NetworkError("reset".into()),
                });
            let mut lister = RepositoryLister::new(Arc::new(mock), 2);

            assert!(lister.next_page().await.is_ok());
            let err = lister.next_page().await.unwrap_err();
            assert!(matches!(err, BackupError::ListRepositories { page: 2, .. }));
        }
    }

    mod resolver {
        use super::*;

        #[tokio::test]
        async fn resolves_and_filters() {
            let mock = MockForge::new().with_branches("o/r", &["main", "dependabot/x", "dev"]);
            let descriptor = RepositoryDescriptor::new("r", "o", "o/r");

            let resolved = resolve_branches(&mock, descriptor).await.unwrap();
            assert_eq!(resolved.branches, names(&["main", "dev"]));
        }

        #[tokio::test]
        async fn page_keeps_listing_order() {
            let mock = MockForge::new().with_generated_repositories("octo", 12);
            let page = mock.list_repositories(1, 12).await.unwrap();
            let expected: Vec<String> = page.iter().map(|d| d.full_name.clone()).collect();

            let resolved = resolve_page(Arc::new(mock), page).await.unwrap();
            let got: Vec<String> = resolved.iter().map(|d| d.full_name.clone()).collect();

            assert_eq!(got, expected);
            assert!(resolved.iter().all(|d| d.branches == names(&["main"])));
        }

        #[tokio::test]
        async fn one_failure_fails_the_page() {
            let mock = MockForge::new()
                .with_generated_repositories("octo", 3)
                .fail_on(FailOn::ListBranches {
                    full_name: "octo/repo-001".into(),
                    error: ForgeError::ApiError {
                        status: 500,
                        message: "boom".into(),
                    },
                });
            let page = mock.list_repositories(1, 3).await.unwrap();

            let err = resolve_page(Arc::new(mock), page).await.unwrap_err();
            match err {
                BackupError::ResolveBranches { full_name, .. } => {
                    assert_eq!(full_name, "octo/repo-001")
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn empty_page() {
            let resolved = resolve_page(Arc::new(MockForge::new()), Vec::new())
                .await
                .unwrap();
            assert!(resolved.is_empty());
        }
    }

    #[tokio::test]
    async fn discover_walks_every_page() {
        let mock = MockForge::new()
            .with_generated_repositories("octo", 5)
            .with_branches("octo/repo-004", &["main", "dependabot/cargo/x", "next"]);

        let descriptors = discover_repositories(Arc::new(mock), 2).await.unwrap();

        assert_eq!(descriptors.len(), 5);
        assert_eq!(descriptors[4].full_name, "octo/repo-004");
        assert_eq!(descriptors[4].branches, names(&["main", "next"]));
    }
}
