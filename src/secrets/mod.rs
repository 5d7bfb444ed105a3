//! secrets
//!
//! Secret storage for the forge token.
//!
//! # Architecture
//!
//! Secrets are stored through the `SecretStore` trait:
//!
//! - [`FileSecretStore`]: `~/.githook/secrets.toml` (default)
//! - `KeychainSecretStore`: OS keychain (`keychain` feature)
//!
//! The GitHub token lives under [`GITHUB_TOKEN_KEY`]. In hook and CI
//! environments it can also come from [`TOKEN_ENV`], which takes precedence
//! over the store (see [`resolve_token`]).
//!
//! # Security
//!
//! - Secrets are **never** logged or included in error messages
//! - File store uses 0600 permissions on Unix (owner read/write only)
//! - All writes are atomic (temp file + rename)

mod file_store;
#[cfg(feature = "keychain")]
mod keychain_store;
mod traits;

pub use file_store::{FileSecretStore, SECRETS_FILE_ENV};
#[cfg(feature = "keychain")]
pub use keychain_store::KeychainSecretStore;
pub use traits::{SecretError, SecretStore};

/// The default secret store provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Key of the GitHub personal access token.
pub const GITHUB_TOKEN_KEY: &str = "github.pat";

/// Environment variable that supplies the token without touching the store.
pub const TOKEN_ENV: &str = "GITHOOK_TOKEN";

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// [`TOKEN_ENV`]
    Environment,
    /// The configured secret store
    Store,
}

/// Create a secret store based on the provider name.
///
/// # Errors
///
/// - Unknown provider name
/// - `"keychain"` without the `keychain` feature
pub fn create_store(provider: &str) -> Result<Box<dyn SecretStore>, SecretError> {
    match provider {
        "file" => Ok(Box::new(FileSecretStore::new()?)),
        #[cfg(feature = "keychain")]
        "keychain" => Ok(Box::new(KeychainSecretStore::new())),
        #[cfg(not(feature = "keychain"))]
        "keychain" => Err(SecretError::ProviderNotAvailable(
            "keychain support not enabled (compile with --features keychain)".into(),
        )),
        other => Err(SecretError::ProviderNotAvailable(format!(
            "unknown secret provider: '{}' (valid: file, keychain)",
            other
        ))),
    }
}

/// Find the GitHub token: the environment first, then the store.
///
/// Empty values count as absent.
pub fn resolve_token(
    store: &dyn SecretStore,
) -> Result<Option<(String, TokenSource)>, SecretError> {
    if let Some(token) = std::env::var(TOKEN_ENV).ok().filter(|t| !t.trim().is_empty()) {
        return Ok(Some((token.trim().to_string(), TokenSource::Environment)));
    }
    Ok(store
        .get(GITHUB_TOKEN_KEY)?
        .filter(|t| !t.trim().is_empty())
        .map(|t| (t, TokenSource::Store)))
}
