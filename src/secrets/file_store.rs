//! secrets::file_store
//!
//! Secrets kept in a TOML table on disk.
//!
//! The file is `~/.githook/secrets.toml` unless `GITHOOK_SECRETS_FILE`
//! names another path. On Unix it is created with mode 0600 and every
//! write replaces it atomically.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::traits::{SecretError, SecretStore};

/// Environment variable overriding the secrets file location.
pub const SECRETS_FILE_ENV: &str = "GITHOOK_SECRETS_FILE";

/// File-backed secret store, the default provider.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Open the store at its default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined and no
    /// override is set.
    pub fn new() -> Result<Self, SecretError> {
        if let Some(path) = std::env::var_os(SECRETS_FILE_ENV).filter(|p| !p.is_empty()) {
            return Ok(Self::with_path(PathBuf::from(path)));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| SecretError::ReadError("cannot determine home directory".into()))?;
        Ok(Self::with_path(home.join(".githook").join("secrets.toml")))
    }

    /// Open the store at an explicit path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the secrets file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, SecretError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(SecretError::ReadError(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e.kind()
                )))
            }
        };

        // toml errors quote the offending line, which may hold a token.
        toml::from_str(&content).map_err(|_| {
            SecretError::ReadError(format!("cannot parse {}", self.path.display()))
        })
    }

    fn store(&self, secrets: &BTreeMap<String, String>) -> Result<(), SecretError> {
        let write_err = |what: &str, e: std::io::Error| {
            SecretError::WriteError(format!("{}: {}", what, e.kind()))
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err("cannot create directory", e))?;
        }

        let content = toml::to_string(secrets)
            .map_err(|e| SecretError::WriteError(format!("cannot serialize secrets: {}", e)))?;

        let temp_path = self.path.with_extension("toml.tmp");
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        {
            let mut file = options
                .open(&temp_path)
                .map_err(|e| write_err("cannot create temp file", e))?;
            // mode() only applies on creation; tighten a leftover temp file too.
            #[cfg(unix)]
            {
                file.set_permissions(fs::Permissions::from_mode(0o600))
                    .map_err(|e| write_err("cannot set permissions", e))?;
            }
            file.write_all(content.as_bytes())
                .map_err(|e| write_err("cannot write secrets", e))?;
            file.sync_all()
                .map_err(|e| write_err("cannot sync secrets", e))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| write_err("cannot replace secrets", e))?;
        tracing::debug!(path = %self.path.display(), entries = secrets.len(), "wrote secrets file");
        Ok(())
    }

    /// Whether the file is absent or readable by its owner only.
    #[cfg(unix)]
    pub fn has_private_permissions(&self) -> Result<bool, SecretError> {
        match fs::metadata(&self.path) {
            Ok(metadata) => Ok(metadata.permissions().mode() & 0o077 == 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(SecretError::ReadError(format!(
                "cannot stat {}: {}",
                self.path.display(),
                e.kind()
            ))),
        }
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        let mut secrets = self.load()?;
        secrets.insert(key.to_string(), value.to_string());
        self.store(&secrets)
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        let mut secrets = self.load()?;
        if secrets.remove(key).is_none() {
            return Ok(());
        }
        self.store(&secrets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> FileSecretStore {
        FileSecretStore::with_path(temp.path().join("githook").join("secrets.toml"))
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        assert_eq!(store.get("github.pat").unwrap(), None);
        assert!(!store.exists("github.pat").unwrap());
    }

    #[test]
    fn set_get_overwrite() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.set("github.pat", "first").unwrap();
        store.set("github.pat", "second").unwrap();
        assert_eq!(store.get("github.pat").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn delete_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.delete("github.pat").unwrap();
        assert!(!store.path().exists(), "deleting nothing must not create the file");

        store.set("github.pat", "t").unwrap();
        store.delete("github.pat").unwrap();
        store.delete("github.pat").unwrap();
        assert_eq!(store.get("github.pat").unwrap(), None);
    }

    #[test]
    fn keys_are_independent_and_persist() {
        let temp = TempDir::new().unwrap();
        store_in(&temp).set("github.pat", "a").unwrap();
        store_in(&temp).set("other.key", "b").unwrap();

        let store = store_in(&temp);
        assert_eq!(store.get("github.pat").unwrap().as_deref(), Some("a"));
        assert_eq!(store.get("other.key").unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn values_with_quotes_and_newlines() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let value = "a \"quoted\"\nvalue = with equals";
        store.set("k", value).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some(value));
    }

    #[test]
    fn parse_error_does_not_leak_content() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "github.pat = \"ghp_leaky").unwrap();

        let err = store.get("github.pat").unwrap_err().to_string();
        assert!(err.contains("cannot parse"));
        assert!(!err.contains("ghp_leaky"));
    }

    #[cfg(unix)]
    #[test]
    fn file_is_owner_only() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        assert!(store.has_private_permissions().unwrap());

        store.set("github.pat", "t").unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(store.has_private_permissions().unwrap());
    }
}
