//! secrets::traits
//!
//! Secret storage trait definition.
//!
//! Keys are dotted names (`github.pat`). Values are opaque strings and never
//! appear in logs, `Debug` output or error messages.

use thiserror::Error;

/// Errors from secret storage operations.
///
/// Messages describe the storage failure only, never the secret.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to read from secret storage.
    #[error("failed to read secret: {0}")]
    ReadError(String),

    /// Failed to write to secret storage.
    #[error("failed to write secret: {0}")]
    WriteError(String),

    /// Failed to delete from secret storage.
    #[error("failed to delete secret: {0}")]
    DeleteError(String),

    /// Provider not available or not configured.
    #[error("secret provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// A key-value store for credentials.
pub trait SecretStore: Send + Sync {
    /// Get a secret, `Ok(None)` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Set a secret, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Delete a secret. Deleting an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), SecretError>;

    /// Check if a secret exists.
    fn exists(&self, key: &str) -> Result<bool, SecretError> {
        Ok(self.get(key)?.is_some())
    }
}
