//! forge::github
//!
//! GitHub forge implementation using the REST API.
//!
//! # Endpoints
//!
//! - `GET /user/repos?type=all&per_page=P&page=N` - repository listing
//! - `GET /repos/{owner}/{repo}/branches?per_page=100&page=N` - branches
//! - `GET /repos/{owner}/{repo}/{tarball|zipball}/{branch}` - archives
//! - `GET /` - token scopes via the `X-OAuth-Scopes` header
//!
//! # Redirects
//!
//! The archive endpoint answers with a 302 to a short-lived storage URL.
//! The HTTP client is built with automatic redirects disabled and the
//! archive request follows `Location` itself, re-sending the original
//! header set (Authorization and User-Agent included) on every hop. A
//! client that follows redirects on its own drops Authorization when the
//! host changes.
//!
//! # Example
//!
//! ```ignore
//! use ghbackup::auth::Credential;
//! use ghbackup::forge::github::GitHubForge;
//! use ghbackup::forge::Forge;
//!
//! let forge = GitHubForge::new(Credential::new("ghp_xxx")?)?;
//! let first_page = forge.list_repositories(1, 20).await?;
//! ```

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LOCATION, USER_AGENT};
use reqwest::{redirect, Client, Response, StatusCode, Url};
use serde::Deserialize;

use super::traits::{ArchiveResponse, Forge, ForgeError};
use crate::auth::Credential;
use crate::core::config::DEFAULT_API_BASE;
use crate::core::types::{ArchiveFormat, RepositoryDescriptor};

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "ghbackup";

/// GitHub REST API version pinned on every request.
const API_VERSION: &str = "2022-11-28";

/// Branches requested per page (GitHub's max).
const BRANCHES_PER_PAGE: u32 = 100;

/// Redirect hops followed for one archive request.
const MAX_REDIRECTS: usize = 10;

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client with automatic redirects disabled
    client: Client,
    /// Bearer credential for every request
    credential: Credential,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
}

// Custom Debug to avoid exposing the client internals
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("credential", &self.credential)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubForge {
    /// Create a GitHub forge against `https://api.github.com`.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::NetworkError` if the HTTP client cannot be built.
    pub fn new(credential: Credential) -> Result<Self, ForgeError> {
        Self::with_api_base(credential, DEFAULT_API_BASE)
    }

    /// Create a GitHub forge with a custom API base URL.
    ///
    /// Use this for GitHub Enterprise (e.g. `https://github.example.com/api/v3`)
    /// and for tests against a local mock server.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::NetworkError` if the HTTP client cannot be built.
    pub fn with_api_base(
        credential: Credential,
        api_base: impl Into<String>,
    ) -> Result<Self, ForgeError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            credential,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// API base URL in use.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let mut auth = HeaderValue::from_str(&self.credential.bearer_header()).map_err(|_| {
            ForgeError::AuthFailed("token contains characters not allowed in a header".into())
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, full_name: &str, path: &str) -> String {
        format!("{}/repos/{}/{}", self.api_base, full_name, path)
    }

    /// GET a URL and decode a JSON body, mapping error statuses.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ForgeError> {
        let response = self
            .client
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(response, status).await);
        }

        response.json().await.map_err(|e| ForgeError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// GET a URL, following redirects with the original headers.
    ///
    /// Returns the first response that is not a redirect carrying a
    /// `Location` header.
    async fn get_following_redirects(&self, url: &str) -> Result<Response, ForgeError> {
        let headers = self.headers()?;
        let mut current =
            Url::parse(url).map_err(|e| ForgeError::InvalidUrl(format!("{}: {}", url, e)))?;

        for _ in 0..=MAX_REDIRECTS {
            let response = self
                .client
                .get(current.clone())
                .headers(headers.clone())
                .send()
                .await
                .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

            if !response.status().is_redirection() {
                return Ok(response);
            }

            let Some(location) = response.headers().get(LOCATION) else {
                return Ok(response);
            };

            let location = location
                .to_str()
                .map_err(|e| ForgeError::InvalidUrl(format!("Location header: {}", e)))?;
            let next = current
                .join(location)
                .map_err(|e| ForgeError::InvalidUrl(format!("{}: {}", location, e)))?;

            tracing::debug!(status = %response.status(), to = %next, "following redirect");
            current = next;
        }

        Err(ForgeError::TooManyRedirects(url.to_string()))
    }

    /// Map an error response from the API.
    async fn error_from_response(response: Response, status: StatusCode) -> ForgeError {
        // Extract permission headers before consuming response body.
        let headers = response.headers();
        let required_scopes = headers
            .get("X-Accepted-OAuth-Scopes")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let granted_scopes = headers
            .get("X-OAuth-Scopes")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN => {
                let mut err_msg = format!("Permission denied: {}", message);
                if let Some(scopes) = required_scopes.filter(|s| !s.is_empty()) {
                    err_msg.push_str(&format!(" [required scopes: {}]", scopes));
                    if let Some(granted) = granted_scopes {
                        err_msg.push_str(&format!(" [granted: {}]", granted));
                    }
                }
                ForgeError::AuthFailed(err_msg)
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn list_repositories(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RepositoryDescriptor>, ForgeError> {
        let url = format!(
            "{}/user/repos?type=all&per_page={}&page={}",
            self.api_base, per_page, page
        );

        let repos: Vec<GitHubRepository> = self.get_json(&url).await?;
        Ok(repos.into_iter().map(Into::into).collect())
    }

    async fn list_branches(&self, full_name: &str) -> Result<Vec<String>, ForgeError> {
        let mut names = Vec::new();
        let mut page: u32 = 1;

        loop {
            let url = format!(
                "{}?per_page={}&page={}",
                self.repo_url(full_name, "branches"),
                BRANCHES_PER_PAGE,
                page
            );

            let branches: Vec<GitHubBranch> = self.get_json(&url).await?;
            let page_count = branches.len();
            names.extend(branches.into_iter().map(|b| b.name));

            if page_count < BRANCHES_PER_PAGE as usize {
                break;
            }

            page += 1;
        }

        Ok(names)
    }

    async fn fetch_archive(
        &self,
        full_name: &str,
        branch: &str,
        format: ArchiveFormat,
    ) -> Result<ArchiveResponse, ForgeError> {
        let url = self.repo_url(full_name, &format!("{}/{}", format.endpoint(), branch));
        let response = self.get_following_redirects(&url).await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Ok(ArchiveResponse::Unavailable {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| ForgeError::NetworkError(e.to_string()));
        Ok(ArchiveResponse::Ready(Box::pin(stream)))
    }

    async fn token_scopes(&self) -> Result<Vec<String>, ForgeError> {
        let response = self
            .client
            .get(&self.api_base)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(response, status).await);
        }

        let scopes = response
            .headers()
            .get("X-OAuth-Scopes")
            .and_then(|v| v.to_str().ok())
            .map(parse_scopes)
            .unwrap_or_default();

        Ok(scopes)
    }
}

/// Split an `X-OAuth-Scopes` header value (`"repo, read:org"`).
pub fn parse_scopes(header: &str) -> Vec<String> {
    header
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// --------------------------------------------------------------------------
// API Response Types
// --------------------------------------------------------------------------

/// Repository item from `/user/repos`.
#[derive(Deserialize)]
struct GitHubRepository {
    name: String,
    owner: GitHubOwner,
    full_name: String,
}

/// Minimal GitHub owner info.
#[derive(Deserialize)]
struct GitHubOwner {
    login: String,
}

/// Branch item from `/repos/{owner}/{repo}/branches`.
#[derive(Deserialize)]
struct GitHubBranch {
    name: String,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

impl From<GitHubRepository> for RepositoryDescriptor {
    fn from(repo: GitHubRepository) -> Self {
        RepositoryDescriptor::new(repo.name, repo.owner.login, repo.full_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential::new("ghp_test_token_value").unwrap()
    }

    mod github_forge {
        use super::*;

        #[test]
        fn new_uses_default_api_base() {
            let forge = GitHubForge::new(credential()).unwrap();
            assert_eq!(forge.name(), "github");
            assert_eq!(forge.api_base(), "https://api.github.com");
        }

        #[test]
        fn with_api_base_trims_trailing_slash() {
            let forge =
                GitHubForge::with_api_base(credential(), "https://github.example.com/api/v3/")
                    .unwrap();
            assert_eq!(forge.api_base(), "https://github.example.com/api/v3");
        }

        #[test]
        fn repo_url_format() {
            let forge = GitHubForge::new(credential()).unwrap();
            assert_eq!(
                forge.repo_url("octocat/hello-world", "branches"),
                "https://api.github.com/repos/octocat/hello-world/branches"
            );
            assert_eq!(
                forge.repo_url("octocat/hello-world", "tarball/main"),
                "https://api.github.com/repos/octocat/hello-world/tarball/main"
            );
        }

        #[test]
        fn headers_carry_bearer_and_user_agent() {
            let forge = GitHubForge::new(credential()).unwrap();
            let headers = forge.headers().unwrap();
            assert_eq!(
                headers.get(AUTHORIZATION).unwrap(),
                "Bearer ghp_test_token_value"
            );
            assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
            assert_eq!(headers.get(USER_AGENT).unwrap(), "ghbackup");
            assert_eq!(
                headers.get(ACCEPT).unwrap(),
                "application/vnd.github+json"
            );
            assert_eq!(headers.get("X-GitHub-Api-Version").unwrap(), "2022-11-28");
        }

        #[test]
        fn debug_redacts_token() {
            let forge = GitHubForge::new(credential()).unwrap();
            let debug_output = format!("{:?}", forge);
            assert!(!debug_output.contains("ghp_test_token_value"));
            assert!(debug_output.contains("api_base"));
        }
    }

    mod parse_scopes {
        use super::*;

        #[test]
        fn splits_and_trims() {
            assert_eq!(parse_scopes("repo, read:org"), vec!["repo", "read:org"]);
        }

        #[test]
        fn empty_header() {
            assert!(parse_scopes("").is_empty());
        }
    }

    mod conversions {
        use super::*;

        #[test]
        fn repository_into_descriptor() {
            let json = r#"{
                "name": "hello-world",
                "owner": { "login": "octocat", "id": 1 },
                "full_name": "octocat/hello-world",
                "private": false
            }"#;
            let repo: GitHubRepository = serde_json::from_str(json).unwrap();
            let descriptor: RepositoryDescriptor = repo.into();

            assert_eq!(descriptor.name, "hello-world");
            assert_eq!(descriptor.owner_login, "octocat");
            assert_eq!(descriptor.full_name, "octocat/hello-world");
            assert!(descriptor.branches.is_empty());
        }
    }
}
