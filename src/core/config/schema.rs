//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Unknown keys are rejected at parse time. Values are checked afterwards
//! by `validate()` (the forge must be known, the repo name must be a valid
//! repository name, and so on).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::RepoName;
use crate::forge::Protocol;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// default_forge = "github"
///
/// [secrets]
/// provider = "file"
///
/// [github]
/// api_base = "https://github.example.com/api/v3"
/// organization = "acme"
/// private = true
/// protocol = "ssh"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default forge (e.g., "github")
    pub default_forge: Option<String>,

    /// Secret storage settings
    pub secrets: Option<SecretsConfig>,

    /// GitHub settings
    pub github: Option<GitHubConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(forge) = &self.default_forge {
            let valid_forges = crate::forge::valid_forge_names();
            if !valid_forges.contains(&forge.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid forge '{}', must be one of: {}",
                    forge,
                    valid_forges.join(", ")
                )));
            }
        }

        if let Some(secrets) = &self.secrets {
            secrets.validate()?;
        }
        if let Some(github) = &self.github {
            github.validate()?;
        }

        Ok(())
    }
}

/// Secret storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SecretsConfig {
    /// Provider: "file" (default) or "keychain"
    pub provider: Option<String>,
}

impl SecretsConfig {
    /// Valid secret provider names.
    pub const VALID_PROVIDERS: &'static [&'static str] = &["file", "keychain"];

    /// Validate the provider name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            if !Self::VALID_PROVIDERS.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid secrets provider '{}', must be one of: {}",
                    provider,
                    Self::VALID_PROVIDERS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// GitHub settings used when creating remote repositories.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    /// REST API base URL (GitHub Enterprise)
    pub api_base: Option<String>,

    /// Organization that owns new repositories (the user when unset)
    pub organization: Option<String>,

    /// Create repositories as private (default: true)
    pub private: Option<bool>,

    /// Clone URL recorded as the remote: "https" (default) or "ssh"
    pub protocol: Option<String>,
}

impl GitHubConfig {
    /// Validate the GitHub settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(api_base) = &self.api_base {
            if !(api_base.starts_with("https://") || api_base.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "github.api_base must be an http(s) URL, got '{}'",
                    api_base
                )));
            }
        }

        if let Some(org) = &self.organization {
            if org.trim().is_empty() || org.contains('/') {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid github.organization '{}'",
                    org
                )));
            }
        }

        if let Some(protocol) = &self.protocol {
            if Protocol::parse(protocol).is_none() {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid github.protocol '{}', must be one of: https, ssh",
                    protocol
                )));
            }
        }

        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// remote = "origin"
/// repo_name = "service-api"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Remote name (default: "origin")
    pub remote: Option<String>,

    /// Name of the repository on the forge (default: derived from the path)
    pub repo_name: Option<String>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(remote) = &self.remote {
            validate_remote_name(remote)?;
        }

        if let Some(name) = &self.repo_name {
            RepoName::new(name.as_str())
                .map_err(|e| ConfigError::InvalidValue(format!("invalid repo_name: {}", e)))?;
        }

        Ok(())
    }
}

/// Check that `name` can be used in `remote.<name>.*` config keys.
pub fn validate_remote_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::InvalidValue(
            "remote cannot be empty".to_string(),
        ));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control())
        || name.contains("..")
        || name.starts_with('-')
    {
        return Err(ConfigError::InvalidValue(format!(
            "invalid remote name '{}'",
            name
        )));
    }
    Ok(())
}
