//! setup-remote command - Create the forge repository and push to it

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::config::{Config, ConfigError};
use crate::core::types::RepoName;
use crate::forge::{self, Protocol};
use crate::remote::{self, SetupOptions};
use crate::secrets::{self, TokenSource};

/// Arguments of `githook setup-remote`; `None` defers to configuration.
#[derive(Debug, Clone, Default)]
pub struct SetupArgs {
    /// Repository name on the forge
    pub name: Option<String>,
    /// Git remote to configure
    pub remote: Option<String>,
    /// Visibility override
    pub private: Option<bool>,
    /// Repository description
    pub description: Option<String>,
    /// Clone URL protocol override
    pub protocol: Option<Protocol>,
}

/// Create the repository on the forge, configure the remote and push.
///
/// Afterwards the repository name is recorded in the repo config if none
/// was configured. That step is best-effort: a failure prints a warning on
/// stderr and the command still succeeds.
pub fn setup_remote(ctx: &Context, args: SetupArgs) -> Result<()> {
    let git = ctx.open_repo()?;
    let git_dir = git.git_dir().to_path_buf();
    let config = Config::load(Some(git_dir.as_path())).context("Failed to load configuration")?;

    let options = resolve_options(&config, &args)?;

    let store = secrets::create_store(config.secrets_provider())
        .context("Failed to initialize secret store")?;
    let Some((token, source)) = secrets::resolve_token(store.as_ref())? else {
        bail!(
            "Not authenticated. Run 'githook auth' or set {}.",
            secrets::TOKEN_ENV
        );
    };
    if source == TokenSource::Environment {
        tracing::debug!("using token from {}", secrets::TOKEN_ENV);
    }

    let forge = forge::create_forge(config.default_forge(), &token, &config.forge_settings())
        .context("Failed to create forge client")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let outcome = runtime
        .block_on(remote::setup_remote(
            &git,
            forge.as_ref(),
            Some(token.as_str()),
            &options,
        ))
        .context("Remote setup failed")?;

    // The remote exists and is pushed at this point, so a failed write is
    // reported without failing the command.
    if let Err(e) = remember_repo_name(&git_dir, &config, &outcome.repo_name) {
        tracing::warn!(error = %e, "could not record repo_name in repo config");
        eprintln!(
            "warning: could not record repo_name '{}' in {}: {}",
            outcome.repo_name,
            Config::repo_config_path(&git_dir).display(),
            e
        );
    }

    if !ctx.quiet {
        println!(
            "Created {} and pushed {} branch(es) to {}",
            outcome.html_url,
            outcome.pushed.len(),
            outcome.remote
        );
    }
    Ok(())
}

/// Record `name` as the repo config's `repo_name` unless one is set.
///
/// Returns whether the config file was written.
fn remember_repo_name(git_dir: &Path, config: &Config, name: &RepoName) -> Result<bool, ConfigError> {
    if config.repo_name().is_some() {
        return Ok(false);
    }
    let mut repo_config = config.repo.clone().unwrap_or_default();
    repo_config.repo_name = Some(name.to_string());
    Config::write_repo(git_dir, &repo_config)?;
    Ok(true)
}

/// Merge command-line arguments over configuration.
fn resolve_options(config: &Config, args: &SetupArgs) -> Result<SetupOptions> {
    let repo_name = args
        .name
        .as_deref()
        .or(config.repo_name())
        .map(RepoName::new)
        .transpose()
        .context("Invalid repository name")?;

    Ok(SetupOptions {
        remote: args
            .remote
            .clone()
            .unwrap_or_else(|| config.remote().to_string()),
        repo_name,
        private: args.private.unwrap_or_else(|| config.private_repositories()),
        description: args.description.clone(),
        protocol: args.protocol.unwrap_or_else(|| config.protocol()),
    })
}
