//! secrets::keychain_store
//!
//! Secrets held by the OS credential store (macOS Keychain, Windows
//! Credential Manager, Secret Service on Linux) through `keyring`.
//!
//! Only compiled with the `keychain` feature.

use keyring::Entry;

use super::traits::{SecretError, SecretStore};

/// Service name under which entries are filed.
const SERVICE: &str = "githook";

/// OS keychain secret store.
#[derive(Debug)]
pub struct KeychainSecretStore {
    service: String,
}

impl KeychainSecretStore {
    /// Store entries under the `githook` service.
    pub fn new() -> Self {
        Self::with_service(SERVICE)
    }

    /// Store entries under a custom service name.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, SecretError> {
        Entry::new(&self.service, key)
            .map_err(|e| SecretError::ProviderNotAvailable(format!("keychain: {}", e)))
    }
}

impl Default for KeychainSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for KeychainSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SecretError::ReadError(format!("keychain: {}", e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| SecretError::WriteError(format!("keychain: {}", e)))
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecretError::DeleteError(format!("keychain: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_service_name() {
        assert_eq!(KeychainSecretStore::new().service, "githook");
        assert_eq!(KeychainSecretStore::with_service("x").service, "x");
    }

    // Touches the real credential store; run with --ignored on a desktop.
    #[test]
    #[ignore]
    fn round_trip_against_os_keychain() {
        let store = KeychainSecretStore::with_service(format!("githook-test-{}", std::process::id()));
        store.set("github.pat", "value").unwrap();
        assert_eq!(store.get("github.pat").unwrap().as_deref(), Some("value"));
        store.delete("github.pat").unwrap();
        assert_eq!(store.get("github.pat").unwrap(), None);
    }
}
