//! forge::factory
//!
//! Forge selection and creation.
//!
//! # Design
//!
//! Commands use `create_forge()` instead of directly importing specific
//! forge implementations. The provider name comes from the global config
//! (`default_forge`).
//!
//! # Example
//!
//! ```ignore
//! use githook::forge::{create_forge, ForgeSettings};
//!
//! let settings = ForgeSettings { organization: Some("acme".into()), ..Default::default() };
//! let forge = create_forge("github", "ghp_token", &settings)?;
//! ```

use super::github::GitHubForge;
use super::traits::{Forge, ForgeError};

/// Supported forge providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgeProvider {
    /// GitHub (github.com or GitHub Enterprise)
    GitHub,
}

impl ForgeProvider {
    /// Get all available providers.
    pub fn all() -> &'static [ForgeProvider] {
        &[ForgeProvider::GitHub]
    }

    /// Get the provider name as a string.
    ///
    /// This matches the name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            ForgeProvider::GitHub => "github",
        }
    }

    /// Parse a provider from a string, ignoring case.
    ///
    /// # Example
    ///
    /// ```
    /// use githook::forge::ForgeProvider;
    ///
    /// assert_eq!(ForgeProvider::parse("GitHub"), Some(ForgeProvider::GitHub));
    /// assert_eq!(ForgeProvider::parse("unknown"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" => Some(ForgeProvider::GitHub),
            _ => None,
        }
    }
}

impl std::fmt::Display for ForgeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Get the names of all valid forge providers.
pub fn valid_forge_names() -> Vec<&'static str> {
    ForgeProvider::all().iter().map(|p| p.name()).collect()
}

/// Provider-independent knobs for creating a forge.
#[derive(Debug, Clone, Default)]
pub struct ForgeSettings {
    /// API base URL; the provider's public endpoint when `None`
    pub api_base: Option<String>,
    /// Organization that owns created repositories
    pub organization: Option<String>,
}

/// Create a forge by provider name.
///
/// # Errors
///
/// - [`ForgeError::UnknownProvider`] if `provider` is not a known forge
/// - [`ForgeError::AuthRequired`] if `token` is empty
pub fn create_forge(
    provider: &str,
    token: &str,
    settings: &ForgeSettings,
) -> Result<Box<dyn Forge>, ForgeError> {
    let provider = ForgeProvider::parse(provider)
        .ok_or_else(|| ForgeError::UnknownProvider(provider.to_string()))?;

    if token.is_empty() {
        return Err(ForgeError::AuthRequired);
    }

    match provider {
        ForgeProvider::GitHub => {
            let mut forge = GitHubForge::new(token);
            if let Some(api_base) = &settings.api_base {
                forge = forge.with_api_base(api_base);
            }
            if let Some(org) = &settings.organization {
                forge = forge.with_organization(org);
            }
            Ok(Box::new(forge))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod forge_provider {
        use super::*;

        #[test]
        fn name_and_display_agree() {
            assert_eq!(ForgeProvider::GitHub.name(), "github");
            assert_eq!(format!("{}", ForgeProvider::GitHub), "github");
        }

        #[test]
        fn parse_case_insensitive() {
            assert_eq!(ForgeProvider::parse("GITHUB"), Some(ForgeProvider::GitHub));
            assert_eq!(ForgeProvider::parse("gitlab"), None);
        }

        #[test]
        fn valid_names() {
            assert_eq!(valid_forge_names(), vec!["github"]);
        }
    }

    mod create_forge {
        use super::*;

        #[test]
        fn github_with_settings() {
            let settings = ForgeSettings {
                api_base: Some("https://github.example.com/api/v3".into()),
                organization: Some("acme".into()),
            };
            let forge = create_forge("github", "token", &settings).unwrap();
            assert_eq!(forge.name(), "github");
        }

        #[test]
        fn unknown_provider() {
            let result = create_forge("bitbucket", "token", &ForgeSettings::default());
            assert!(matches!(result, Err(ForgeError::UnknownProvider(p)) if p == "bitbucket"));
        }

        #[test]
        fn empty_token() {
            let result = create_forge("github", "", &ForgeSettings::default());
            assert!(matches!(result, Err(ForgeError::AuthRequired)));
        }
    }
}
