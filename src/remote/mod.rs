//! remote
//!
//! Provision a repository on the forge and publish local branches to it.
//!
//! # Flow
//!
//! 1. Name the repository after the local one (last path component, `.git`
//!    stripped) unless a name is configured.
//! 2. Ask the forge to create it.
//! 3. Record the clone URL as a remote with the standard fetch refspec,
//!    and make every local branch track its namesake on that remote.
//! 4. Push every local branch.
//!
//! The repository config is only touched after the forge call succeeds.
//! If the push fails the remote stays configured, so a plain `git push`
//! can finish the job.

use std::path::Path;

use thiserror::Error;

use crate::core::config::schema::validate_remote_name;
use crate::core::types::{BranchName, RefName, RepoName};
use crate::forge::{CreateRepoRequest, Forge, ForgeError, Protocol};
use crate::git::{Credentials, Git, GitError, RepoInfo};

/// Username GitHub expects alongside a token for HTTPS pushes.
pub const TOKEN_USERNAME: &str = "x-access-token";

/// Errors from remote setup.
#[derive(Debug, Error)]
pub enum RemoteSetupError {
    /// No usable repository name could be determined.
    #[error("cannot name repository: {0}")]
    Name(String),

    /// The remote name is not usable in git config.
    #[error("invalid remote name: {0}")]
    InvalidRemote(String),

    /// The forge refused to create the repository.
    #[error("forge error: {0}")]
    Forge(#[from] ForgeError),

    /// Writing config or pushing failed.
    #[error("git error: {0}")]
    Git(#[from] GitError),
}

/// How to set up the remote.
#[derive(Debug, Clone)]
pub struct SetupOptions {
    /// Name of the git remote to configure
    pub remote: String,
    /// Repository name on the forge; derived from the path when `None`
    pub repo_name: Option<RepoName>,
    /// Create the repository as private
    pub private: bool,
    /// Description shown on the forge
    pub description: Option<String>,
    /// Which clone URL to record
    pub protocol: Protocol,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            repo_name: None,
            private: true,
            description: None,
            protocol: Protocol::Https,
        }
    }
}

/// A finished remote setup.
#[derive(Debug, Clone)]
pub struct SetupOutcome {
    /// Repository name on the forge
    pub repo_name: RepoName,
    /// The configured git remote
    pub remote: String,
    /// The URL recorded for the remote
    pub url: String,
    /// Web page of the new repository
    pub html_url: String,
    /// Branches that were pushed
    pub pushed: Vec<BranchName>,
}

/// Derive the forge repository name from the repository location.
///
/// Uses the work tree directory name, or the git directory name for bare
/// repositories, with a trailing `.git` removed.
pub fn derive_repo_name(info: &RepoInfo) -> Result<RepoName, RemoteSetupError> {
    repo_name_from_path(info.root())
}

fn repo_name_from_path(path: &Path) -> Result<RepoName, RemoteSetupError> {
    let component = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| RemoteSetupError::Name(format!("{} has no usable name", path.display())))?;

    RepoName::new(component).map_err(|e| RemoteSetupError::Name(e.to_string()))
}

/// Credentials for pushing to `url`.
///
/// HTTPS URLs authenticate with the forge token, SSH URLs with the SSH
/// agent. Anything else (local paths, `file://`) needs none.
pub fn push_credentials(url: &str, token: Option<&str>) -> Credentials {
    let is_http = url.starts_with("https://") || url.starts_with("http://");
    let is_ssh = url.starts_with("ssh://")
        || (!url.contains("://") && url.split_once(':').is_some_and(|(host, _)| host.contains('@')));

    match token {
        Some(token) if is_http => Credentials::UserPass {
            username: TOKEN_USERNAME.to_string(),
            password: token.to_string(),
        },
        _ if is_ssh => Credentials::SshAgent,
        _ => Credentials::None,
    }
}

/// Config entries that attach `branches` to `remote` at `url`.
pub fn remote_config_entries(
    remote: &str,
    url: &str,
    branches: &[BranchName],
) -> Vec<(String, String)> {
    let mut entries = vec![
        (format!("remote.{}.url", remote), url.to_string()),
        (
            format!("remote.{}.fetch", remote),
            format!("+refs/heads/*:refs/remotes/{}/*", remote),
        ),
    ];
    for branch in branches {
        entries.push((format!("branch.{}.remote", branch), remote.to_string()));
        entries.push((
            format!("branch.{}.merge", branch),
            RefName::for_branch(branch).to_string(),
        ));
    }
    entries
}

/// Create the forge repository, configure the remote and push.
///
/// `token` is the forge token; it is reused for HTTPS pushes.
pub async fn setup_remote(
    git: &Git,
    forge: &dyn Forge,
    token: Option<&str>,
    options: &SetupOptions,
) -> Result<SetupOutcome, RemoteSetupError> {
    validate_remote_name(&options.remote)
        .map_err(|_| RemoteSetupError::InvalidRemote(options.remote.clone()))?;

    let repo_name = match &options.repo_name {
        Some(name) => name.clone(),
        None => derive_repo_name(&git.info())?,
    };
    let branches = git.list_branches()?;

    let created = forge
        .create_repository(CreateRepoRequest {
            name: repo_name.clone(),
            description: options.description.clone(),
            private: options.private,
        })
        .await?;
    tracing::info!(
        forge = forge.name(),
        repository = %created.full_name,
        "created remote repository"
    );

    let url = created.url_for(options.protocol).to_string();
    git.set_config_entries(&remote_config_entries(&options.remote, &url, &branches))?;
    tracing::debug!(remote = %options.remote, %url, branches = branches.len(), "configured remote");

    if branches.is_empty() {
        tracing::warn!(remote = %options.remote, "no local branches to push");
    } else {
        let refspecs: Vec<String> = branches
            .iter()
            .map(|b| {
                let refname = RefName::for_branch(b);
                format!("{}:{}", refname, refname)
            })
            .collect();
        git.push(&options.remote, &refspecs, &push_credentials(&url, token))?;
        tracing::info!(remote = %options.remote, branches = branches.len(), "pushed branches");
    }

    Ok(SetupOutcome {
        repo_name,
        remote: options.remote.clone(),
        url,
        html_url: created.html_url,
        pushed: branches,
    })
}
