//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge provides a deterministic implementation of the `Forge` trait
//! for use in tests. It keeps created repositories in memory and allows
//! configuring a failure. Clone URLs are built from a configurable base, so
//! a test can point them at a bare repository on disk and push for real.
//!
//! # Example
//!
//! ```
//! use githook::core::types::RepoName;
//! use githook::forge::mock::MockForge;
//! use githook::forge::{CreateRepoRequest, Forge};
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::new();
//!
//! let repo = forge
//!     .create_repository(CreateRepoRequest::new(RepoName::new("project").unwrap()))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(repo.full_name, "mock/project");
//! assert_eq!(forge.repository_count(), 1);
//! # });
//! ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::traits::{CreateRepoRequest, Forge, ForgeError, RemoteRepository};

/// Owner name used in mock repository names.
const MOCK_OWNER: &str = "mock";

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockForge {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockForgeInner {
    /// Created repositories by name.
    repositories: BTreeMap<String, RemoteRepository>,
    /// Prefix for clone URLs.
    url_base: String,
    /// Error to return from the next calls (for testing error paths).
    fail_with: Option<ForgeError>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    CreateRepository {
        name: String,
        private: bool,
    },
}

impl MockForge {
    /// Create a mock whose clone URLs live under `https://forge.invalid/mock`.
    pub fn new() -> Self {
        Self::with_url_base(format!("https://forge.invalid/{}", MOCK_OWNER))
    }

    /// Create a mock whose clone URLs are `<url_base>/<name>.git`.
    ///
    /// Pass a local directory to make pushes land in a bare repository.
    pub fn with_url_base(url_base: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockForgeInner {
                repositories: BTreeMap::new(),
                url_base: url_base.into().trim_end_matches('/').to_string(),
                fail_with: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Make every subsequent call fail with `error`.
    pub fn fail_with(self, error: ForgeError) -> Self {
        self.lock().fail_with = Some(error);
        self
    }

    /// Get recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Number of repositories created so far.
    pub fn repository_count(&self) -> usize {
        self.lock().repositories.len()
    }

    /// Look up a created repository by name.
    pub fn repository(&self, name: &str) -> Option<RemoteRepository> {
        self.lock().repositories.get(name).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockForgeInner> {
        // A panic while holding the lock only happens in a failing test.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_repository(
        &self,
        request: CreateRepoRequest,
    ) -> Result<RemoteRepository, ForgeError> {
        let mut inner = self.lock();
        let name = request.name.as_str().to_string();

        inner.operations.push(MockOperation::CreateRepository {
            name: name.clone(),
            private: request.private,
        });

        if let Some(err) = &inner.fail_with {
            return Err(err.clone());
        }
        if inner.repositories.contains_key(&name) {
            return Err(ForgeError::AlreadyExists(name));
        }

        let url = format!("{}/{}.git", inner.url_base, name);
        let repo = RemoteRepository {
            name: name.clone(),
            full_name: format!("{}/{}", MOCK_OWNER, name),
            clone_url: url.clone(),
            ssh_url: url,
            html_url: format!("https://forge.invalid/{}/{}", MOCK_OWNER, name),
            private: request.private,
        };
        inner.repositories.insert(name, repo.clone());

        Ok(repo)
    }
}
