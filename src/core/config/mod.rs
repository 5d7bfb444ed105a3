//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! githook has two configuration scopes:
//! - **Global**: User-level settings (forge, secrets, GitHub options)
//! - **Repo**: Per-repository settings (remote name, repository name)
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$GITHOOK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/githook/config.toml`
//! 3. `~/.githook/config.toml` (canonical write location)
//!
//! # Repo Config Location
//!
//! `<git dir>/githook/config.toml`. Using the git directory rather than the
//! work tree keeps this working for bare repositories.
//!
//! # Example
//!
//! ```no_run
//! use githook::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/srv/git/project.git"))).unwrap();
//! println!("Remote: {}", config.remote());
//! println!("Forge: {}", config.default_forge());
//! ```

pub mod schema;

pub use schema::{GitHubConfig, GlobalConfig, RepoConfig, SecretsConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::forge::{ForgeSettings, Protocol};

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "GITHOOK_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence rules. Repo config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if one was found)
    pub repo: Option<RepoConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// If `git_dir` is provided, also loads that repository's config.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. Missing files are not an error.
    pub fn load(git_dir: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(&global_candidates(), git_dir)
    }

    /// Load configuration, searching `candidates` for the global file.
    pub fn load_from(candidates: &[PathBuf], git_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let (global, global_path) = match candidates.iter().find(|p| p.is_file()) {
            Some(path) => (read_toml::<GlobalConfig>(path)?, Some(path.clone())),
            None => (GlobalConfig::default(), None),
        };
        global.validate()?;

        let (repo, repo_path) = match git_dir.map(Self::repo_config_path) {
            Some(path) if path.is_file() => {
                let repo = read_toml::<RepoConfig>(&path)?;
                repo.validate()?;
                (Some(repo), Some(path))
            }
            _ => (None, None),
        };

        tracing::debug!(
            global = ?global_path,
            repo = ?repo_path,
            "loaded configuration"
        );

        Ok(Config {
            global,
            repo,
            global_path,
            repo_path,
        })
    }

    /// Get the canonical path for global config: `~/.githook/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".githook").join("config.toml"))
    }

    /// Get the path of the repo config inside `git_dir`.
    pub fn repo_config_path(git_dir: &Path) -> PathBuf {
        git_dir.join("githook").join("config.toml")
    }

    /// Write repo config atomically.
    pub fn write_repo(git_dir: &Path, config: &RepoConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::repo_config_path(git_dir);
        write_toml_atomic(&path, config)?;
        Ok(path)
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the remote name.
    ///
    /// Defaults to "origin" if not configured.
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .unwrap_or("origin")
    }

    /// Get the configured repository name override, if any.
    pub fn repo_name(&self) -> Option<&str> {
        self.repo.as_ref().and_then(|r| r.repo_name.as_deref())
    }

    /// Get the default forge.
    ///
    /// Defaults to "github" if not configured.
    pub fn default_forge(&self) -> &str {
        self.global.default_forge.as_deref().unwrap_or("github")
    }

    /// Get the secrets provider.
    ///
    /// Defaults to "file" if not configured.
    pub fn secrets_provider(&self) -> &str {
        self.global
            .secrets
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or(crate::secrets::DEFAULT_PROVIDER)
    }

    /// Whether new repositories are private.
    ///
    /// Defaults to `true` if not configured.
    pub fn private_repositories(&self) -> bool {
        self.github().and_then(|g| g.private).unwrap_or(true)
    }

    /// Which clone URL to record as the remote.
    ///
    /// Defaults to HTTPS. Validation guarantees the value parses.
    pub fn protocol(&self) -> Protocol {
        self.github()
            .and_then(|g| g.protocol.as_deref())
            .and_then(Protocol::parse)
            .unwrap_or_default()
    }

    /// Settings passed to the forge factory.
    pub fn forge_settings(&self) -> ForgeSettings {
        ForgeSettings {
            api_base: self.github().and_then(|g| g.api_base.clone()),
            organization: self.github().and_then(|g| g.organization.clone()),
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }

    fn github(&self) -> Option<&GitHubConfig> {
        self.global.github.as_ref()
    }
}

/// Global config candidates in search order, from the environment.
pub fn global_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        candidates.push(PathBuf::from(path));
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|p| !p.is_empty()) {
        candidates.push(PathBuf::from(xdg).join("githook").join("config.toml"));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".githook").join("config.toml"));
    }
    candidates
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write a config file atomically (temp file in the same directory, then rename).
fn write_toml_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let write_err = |path: &Path, source| ConfigError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| write_err(path, e))?;
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    let temp_path = path.with_extension("toml.tmp");
    let mut file = fs::File::create(&temp_path).map_err(|e| write_err(&temp_path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| write_err(&temp_path, e))?;
    file.sync_all().map_err(|e| write_err(&temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| write_err(path, e))
}
