//! forge::traits
//!
//! Forge trait definition for interacting with remote hosting services.
//!
//! # Design
//!
//! The `Forge` trait is async because forge operations involve network I/O.
//! All methods return `Result` to handle API errors gracefully. A forge
//! failure never touches the local repository: remote setup only edits
//! config after the forge has answered.
//!
//! # Example
//!
//! ```ignore
//! use githook::forge::{CreateRepoRequest, Forge, ForgeError};
//!
//! async fn provision(forge: &dyn Forge, name: RepoName) -> Result<(), ForgeError> {
//!     let repo = forge.create_repository(CreateRepoRequest::new(name)).await?;
//!     println!("Created {} at {}", repo.full_name, repo.html_url);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::RepoName;

/// Errors from forge operations.
///
/// These error types map to common failure modes when interacting
/// with remote hosting services like GitHub.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A repository with that name already exists for the owner.
    #[error("repository already exists: {0}")]
    AlreadyExists(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// No forge implementation goes by that name.
    #[error("unknown forge provider: {0}")]
    UnknownProvider(String),
}

/// Request to create a repository.
#[derive(Debug, Clone)]
pub struct CreateRepoRequest {
    /// Repository name
    pub name: RepoName,
    /// Short description shown on the forge
    pub description: Option<String>,
    /// Create as private
    pub private: bool,
}

impl CreateRepoRequest {
    /// A private repository with no description.
    pub fn new(name: RepoName) -> Self {
        Self {
            name,
            description: None,
            private: true,
        }
    }
}

/// Repository information returned from the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    /// Repository name
    pub name: String,
    /// `owner/name`
    pub full_name: String,
    /// HTTPS clone URL
    pub clone_url: String,
    /// SSH clone URL
    pub ssh_url: String,
    /// Web URL for viewing
    pub html_url: String,
    /// Whether the repository is private
    pub private: bool,
}

/// Which clone URL to record as the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// `https://host/owner/name.git`
    #[default]
    Https,
    /// `git@host:owner/name.git`
    Ssh,
}

impl Protocol {
    /// Parse a protocol name from configuration.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "https" => Some(Protocol::Https),
            "ssh" => Some(Protocol::Ssh),
            _ => None,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Https => write!(f, "https"),
            Protocol::Ssh => write!(f, "ssh"),
        }
    }
}

impl RemoteRepository {
    /// The clone URL for the given protocol.
    pub fn url_for(&self, protocol: Protocol) -> &str {
        match protocol {
            Protocol::Https => &self.clone_url,
            Protocol::Ssh => &self.ssh_url,
        }
    }
}

/// The forge trait for interacting with remote hosting services.
///
/// Implementations must be `Send + Sync` so a forge can be held across the
/// await point in the CLI's runtime.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github").
    fn name(&self) -> &'static str;

    /// Create a repository owned by the authenticated user or the configured
    /// organization.
    ///
    /// # Errors
    ///
    /// - [`ForgeError::AuthRequired`] / [`ForgeError::AuthFailed`]
    /// - [`ForgeError::AlreadyExists`] if the name is taken
    /// - [`ForgeError::NotFound`] if the organization does not exist
    async fn create_repository(
        &self,
        request: CreateRepoRequest,
    ) -> Result<RemoteRepository, ForgeError>;
}
