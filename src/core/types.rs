//! core::types
//!
//! Domain types for the discovery-and-download pipeline.
//!
//! # Types
//!
//! - [`RepositoryDescriptor`] - One repository plus its resolved branches
//! - [`RepositoryReference`] - Canonical `(full_name, branch)` manifest entry
//! - [`DownloadTask`] - One branch archive to fetch, with its target path
//! - [`ArchiveFormat`] - Archive flavour requested from the forge
//!
//! # Examples
//!
//! ```
//! use ghbackup::core::types::{RepositoryDescriptor, RepositoryReference};
//!
//! let repo = RepositoryDescriptor::new("hello-world", "octocat", "octocat/hello-world")
//!     .with_branches(vec!["main".to_string()]);
//!
//! let refs: Vec<RepositoryReference> = repo.references("github.com").collect();
//! assert_eq!(refs[0].to_string(), "https://github.com/octocat/hello-world/main");
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One repository the account can access.
///
/// Created by the lister with an empty branch list. The branch resolver
/// fills `branches` exactly once; the descriptor is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    /// Repository name (e.g. `hello-world`)
    pub name: String,
    /// Login of the owning user or organization
    pub owner_login: String,
    /// `owner/name`
    pub full_name: String,
    /// Branch names in listing order, disposable branches removed
    pub branches: Vec<String>,
}

impl RepositoryDescriptor {
    /// Create a descriptor with no branches resolved yet.
    pub fn new(
        name: impl Into<String>,
        owner_login: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            owner_login: owner_login.into(),
            full_name: full_name.into(),
            branches: Vec::new(),
        }
    }

    /// Return this descriptor with `branches` appended.
    pub fn with_branches(mut self, branches: Vec<String>) -> Self {
        self.branches.extend(branches);
        self
    }

    /// Manifest references for every resolved branch, in branch order.
    pub fn references<'a>(
        &'a self,
        host: &'a str,
    ) -> impl Iterator<Item = RepositoryReference> + 'a {
        self.branches
            .iter()
            .map(move |branch| RepositoryReference::new(host, &self.full_name, branch))
    }
}

/// A flattened `(full_name, branch)` pair.
///
/// Serialized as `https://<host>/<full_name>/<branch>`. Two references are
/// the same entry exactly when their serialized forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryReference {
    host: String,
    full_name: String,
    branch: String,
}

impl RepositoryReference {
    /// Create a reference for one branch of one repository.
    pub fn new(
        host: impl Into<String>,
        full_name: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            full_name: full_name.into(),
            branch: branch.into(),
        }
    }

    /// Repository full name (`owner/name`).
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Branch name.
    pub fn branch(&self) -> &str {
        &self.branch
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "https://{}/{}/{}", self.host, self.full_name, self.branch)
    }
}

/// Flatten descriptors into serialized manifest lines, in discovery order.
pub fn reference_lines(descriptors: &[RepositoryDescriptor], host: &str) -> Vec<String> {
    descriptors
        .iter()
        .flat_map(|repo| repo.references(host))
        .map(|reference| reference.to_string())
        .collect()
}

/// One branch archive to download.
///
/// Consumed exactly once by the downloader.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// The repository the branch belongs to
    pub repository: Arc<RepositoryDescriptor>,
    /// Branch to archive
    pub branch: String,
    /// Where the archive is written
    pub target: PathBuf,
}

impl DownloadTask {
    /// Repository full name, for endpoint construction and logging.
    pub fn full_name(&self) -> &str {
        &self.repository.full_name
    }
}

/// Archive flavour requested from the forge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    /// gzip-compressed tar archive
    #[default]
    Tarball,
    /// zip archive
    Zipball,
}

impl ArchiveFormat {
    /// Endpoint segment (`tarball` / `zipball`).
    pub fn endpoint(&self) -> &'static str {
        match self {
            ArchiveFormat::Tarball => "tarball",
            ArchiveFormat::Zipball => "zipball",
        }
    }

    /// File extension for stored archives.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Tarball => "tar.gz",
            ArchiveFormat::Zipball => "zip",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod repository_descriptor {
        use super::*;

        #[test]
        fn new_has_no_branches() {
            let repo = RepositoryDescriptor::new("repo", "owner", "owner/repo");
            assert!(repo.branches.is_empty());
            assert_eq!(repo.full_name, "owner/repo");
        }

        #[test]
        fn with_branches_appends() {
            let repo = RepositoryDescriptor::new("repo", "owner", "owner/repo")
                .with_branches(vec!["main".into()])
                .with_branches(vec!["dev".into()]);
            assert_eq!(repo.branches, vec!["main", "dev"]);
        }

        #[test]
        fn references_follow_branch_order() {
            let repo = RepositoryDescriptor::new("repo", "owner", "owner/repo")
                .with_branches(vec!["main".into(), "feature/x".into()]);
            let lines: Vec<String> = repo
                .references("github.com")
                .map(|r| r.to_string())
                .collect();
            assert_eq!(
                lines,
                vec![
                    "https://github.com/owner/repo/main",
                    "https://github.com/owner/repo/feature/x",
                ]
            );
        }
    }

    mod repository_reference {
        use super::*;

        #[test]
        fn display_format() {
            let r = RepositoryReference::new("github.com", "octocat/hello", "main");
            assert_eq!(r.to_string(), "https://github.com/octocat/hello/main");
            assert_eq!(r.full_name(), "octocat/hello");
            assert_eq!(r.branch(), "main");
        }

        #[test]
        fn equality_is_by_serialized_parts() {
            let a = RepositoryReference::new("github.com", "o/r", "main");
            let b = RepositoryReference::new("github.com", "o/r", "main");
            let c = RepositoryReference::new("github.com", "o/r", "dev");
            assert_eq!(a, b);
            assert_ne!(a, c);
        }
    }

    #[test]
    fn reference_lines_flattens_in_discovery_order() {
        let repos = vec![
            RepositoryDescriptor::new("a", "o", "o/a").with_branches(vec!["main".into()]),
            RepositoryDescriptor::new("b", "o", "o/b"),
            RepositoryDescriptor::new("c", "p", "p/c")
                .with_branches(vec!["x".into(), "y".into()]),
        ];
        assert_eq!(
            reference_lines(&repos, "github.com"),
            vec![
                "https://github.com/o/a/main",
                "https://github.com/p/c/x",
                "https://github.com/p/c/y",
            ]
        );
    }

    mod archive_format {
        use super::*;

        #[test]
        fn default_is_tarball() {
            assert_eq!(ArchiveFormat::default(), ArchiveFormat::Tarball);
        }

        #[test]
        fn endpoint_and_extension() {
            assert_eq!(ArchiveFormat::Tarball.endpoint(), "tarball");
            assert_eq!(ArchiveFormat::Tarball.extension(), "tar.gz");
            assert_eq!(ArchiveFormat::Zipball.endpoint(), "zipball");
            assert_eq!(ArchiveFormat::Zipball.extension(), "zip");
        }

        #[test]
        fn deserializes_lowercase() {
            #[derive(Deserialize)]
            struct Wrapper {
                format: ArchiveFormat,
            }
            let w: Wrapper = toml::from_str("format = \"zipball\"").unwrap();
            assert_eq!(w.format, ArchiveFormat::Zipball);
        }
    }
}
