//! forge::github
//!
//! GitHub forge implementation using the REST API.
//!
//! # Endpoints
//!
//! - `POST /user/repos` creates a repository for the authenticated user
//! - `POST /orgs/{org}/repos` creates one under an organization
//!
//! # Authentication
//!
//! A personal access token is sent as a bearer token. The same token is
//! used for HTTPS pushes (see [`crate::remote::push_credentials`]).
//!
//! # Rate Limiting
//!
//! GitHub has rate limits. This implementation:
//! - Returns `ForgeError::RateLimited` when limits are hit
//! - Does not implement automatic retry for rate limits (caller's responsibility)
//!
//! # Example
//!
//! ```ignore
//! use githook::forge::github::GitHubForge;
//! use githook::forge::{CreateRepoRequest, Forge};
//!
//! let forge = GitHubForge::new(token).with_organization("acme");
//! let repo = forge
//!     .create_repository(CreateRepoRequest::new(RepoName::new("project")?))
//!     .await?;
//! println!("{}", repo.clone_url);
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::{CreateRepoRequest, Forge, ForgeError, RemoteRepository};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "githook";

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// Personal access token
    token: String,
    /// Organization that owns created repositories; the user when `None`
    organization: Option<String>,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("has_token", &!self.token.is_empty())
            .field("organization", &self.organization)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubForge {
    /// Create a forge that talks to github.com with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            organization: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Use a different API base URL (GitHub Enterprise, or a test server).
    ///
    /// A trailing slash is ignored.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into();
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Create repositories under an organization instead of the user.
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// The organization repositories are created under, if any.
    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        if self.token.is_empty() {
            return Err(ForgeError::AuthRequired);
        }

        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// URL of the repository creation endpoint.
    fn create_url(&self) -> String {
        match &self.organization {
            Some(org) => format!("{}/orgs/{}/repos", self.api_base, org),
            None => format!("{}/user/repos", self.api_base),
        }
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, ForgeError> {
        let required_scopes = response
            .headers()
            .get("X-Accepted-OAuth-Scopes")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.json::<GitHubErrorResponse>().await.ok();
        let message = body
            .as_ref()
            .map(|b| b.message.clone())
            .unwrap_or_else(|| "Unknown error".to_string());
        let already_exists = body.as_ref().is_some_and(|b| {
            b.errors
                .iter()
                .any(|e| e.message.as_deref().is_some_and(|m| m.contains("already exists")))
        });

        Err(match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN => {
                let mut err_msg = format!("Permission denied: {}", message);
                if let Some(scopes) = required_scopes.filter(|s| !s.is_empty()) {
                    err_msg.push_str(&format!(" [required scopes: {}]", scopes));
                }
                ForgeError::AuthFailed(err_msg)
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::UNPROCESSABLE_ENTITY if already_exists => {
                ForgeError::AlreadyExists(message)
            }
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn create_repository(
        &self,
        request: CreateRepoRequest,
    ) -> Result<RemoteRepository, ForgeError> {
        let url = self.create_url();
        let body = CreateRepoBody {
            name: request.name.as_str(),
            description: request.description.as_deref(),
            private: request.private,
            auto_init: false,
        };

        tracing::debug!(%url, name = %request.name, private = request.private, "creating repository");

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        let repo: GitHubRepository = self.handle_response(response).await?;
        Ok(repo.into())
    }
}

// --------------------------------------------------------------------------
// API Types
// --------------------------------------------------------------------------

/// Request body for creating a repository.
#[derive(Serialize)]
struct CreateRepoBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    private: bool,
    auto_init: bool,
}

/// GitHub repository response (the fields we use).
#[derive(Deserialize)]
struct GitHubRepository {
    name: String,
    full_name: String,
    clone_url: String,
    ssh_url: String,
    html_url: String,
    #[serde(default)]
    private: bool,
}

impl From<GitHubRepository> for RemoteRepository {
    fn from(repo: GitHubRepository) -> Self {
        RemoteRepository {
            name: repo.name,
            full_name: repo.full_name,
            clone_url: repo.clone_url,
            ssh_url: repo.ssh_url,
            html_url: repo.html_url,
            private: repo.private,
        }
    }
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
    #[serde(default)]
    errors: Vec<GitHubErrorDetail>,
}

/// One entry of a validation error list.
#[derive(Deserialize)]
struct GitHubErrorDetail {
    message: Option<String>,
}
