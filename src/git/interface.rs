//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! githook. All repository reads and writes flow through [`Git`], which
//! returns strong types and normalizes libgit2 failures into the typed
//! categories of [`GitError`].
//!
//! # Error Handling
//!
//! - [`GitError::RefNotFound`] / [`GitError::RevisionNotFound`]: a name did not resolve
//! - [`GitError::CasFailed`]: compare-and-swap precondition failed
//! - [`GitError::Locked`]: the ref lock file is held by someone else
//! - [`GitError::Io`]: storage failure underneath libgit2
//!
//! # Example
//!
//! ```ignore
//! use githook::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let tip = git.resolve_ref("refs/heads/main")?;
//! println!("main is at {}", tip.short(7));
//! ```

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::core::types::{BranchName, Oid, TypeError};

/// Upper bound on credential callback invocations for one push.
///
/// libgit2 keeps asking for credentials as long as the server rejects
/// them, so the callback has to give up on its own.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Errors from Git operations.
///
/// The categorization lets higher layers tell "you named something that
/// does not exist" apart from "the repository is broken" and "someone else
/// got there first".
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// A revision expression did not resolve to any object.
    #[error("revision not found: {spec}")]
    RevisionNotFound {
        /// The expression as given by the caller
        spec: String,
    },

    /// A revision resolved, but not to a commit.
    #[error("{spec} does not name a commit")]
    NotACommit {
        /// The expression as given by the caller
        spec: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Compare-and-swap precondition failed.
    ///
    /// The ref moved between the moment it was read and the moment it was
    /// written. The write did not happen.
    #[error("CAS failed for {refname}: expected {expected}, found {actual}")]
    CasFailed {
        /// The ref being updated
        refname: String,
        /// The expected old value
        expected: String,
        /// The actual current value
        actual: String,
    },

    /// The ref (or the packed-refs file) is locked by another writer.
    #[error("{refname} is locked: {message}")]
    Locked {
        /// The ref that could not be locked
        refname: String,
        /// libgit2's description of the lock failure
        message: String,
    },

    /// Remote does not exist in the repository configuration.
    #[error("remote not found: {name}")]
    RemoteNotFound {
        /// The remote name
        name: String,
    },

    /// The remote refused one of the pushed refs.
    #[error("push of {refname} rejected: {message}")]
    PushRejected {
        /// The rejected ref
        refname: String,
        /// The server's reason
        message: String,
    },

    /// Authentication against a remote failed.
    #[error("authentication failed: {message}")]
    Auth {
        /// Description of the failure (never contains credentials)
        message: String,
    },

    /// Filesystem or object database failure.
    #[error("repository I/O error: {message}")]
    Io {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match (err.code(), err.class()) {
            (git2::ErrorCode::NotFound, _) if context.starts_with("refs/") => {
                GitError::RefNotFound {
                    refname: context.to_string(),
                }
            }
            (git2::ErrorCode::NotFound, _) => GitError::ObjectNotFound {
                oid: context.to_string(),
            },
            (git2::ErrorCode::InvalidSpec, _) => GitError::InvalidOid {
                oid: context.to_string(),
            },
            (git2::ErrorCode::Locked, _) => GitError::Locked {
                refname: context.to_string(),
                message: err.message().to_string(),
            },
            (git2::ErrorCode::Auth, _) => GitError::Auth {
                message: err.message().to_string(),
            },
            (
                _,
                git2::ErrorClass::Os
                | git2::ErrorClass::Filesystem
                | git2::ErrorClass::Odb
                | git2::ErrorClass::Zlib,
            ) => GitError::Io {
                message: format!("{}: {}", context, err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    /// Whether this error indicates a storage failure rather than bad input.
    pub fn is_io(&self) -> bool {
        matches!(self, GitError::Io { .. } | GitError::Internal { .. })
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg)
            | TypeError::InvalidBranchName(msg)
            | TypeError::InvalidRepoName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// Information about a Git repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Path to the git directory (`.git`, or the repository itself when bare)
    pub git_dir: PathBuf,
    /// Path to the working directory, `None` for bare repositories
    pub work_dir: Option<PathBuf>,
}

impl RepoInfo {
    /// The directory that names the repository.
    ///
    /// For a bare repository that is the git directory itself
    /// (`/srv/git/project.git`); otherwise the working directory.
    pub fn root(&self) -> &Path {
        self.work_dir.as_deref().unwrap_or(&self.git_dir)
    }
}

/// An identity with its timestamp, as recorded in a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Seconds since the Unix epoch
    pub when: i64,
    /// Timezone offset from UTC in minutes
    pub offset_minutes: i32,
}

impl Signature {
    /// The signature timestamp in its recorded timezone.
    pub fn time(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.offset_minutes * 60)?;
        DateTime::from_timestamp(self.when, 0).map(|t| t.with_timezone(&offset))
    }

    fn from_git2(sig: &git2::Signature<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
            email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
            when: sig.when().seconds(),
            offset_minutes: sig.when().offset_minutes(),
        }
    }

    fn to_git2(&self) -> Result<git2::Signature<'static>, GitError> {
        let time = git2::Time::new(self.when, self.offset_minutes);
        git2::Signature::new(&self.name, &self.email, &time).map_err(|e| GitError::Internal {
            message: format!("invalid signature for {}: {}", self.email, e.message()),
        })
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Information about a commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// The root tree of the snapshot
    pub tree: Oid,
    /// Parent commits, first parent first
    pub parents: Vec<Oid>,
    /// Author identity
    pub author: Signature,
    /// Committer identity
    pub committer: Signature,
    /// First line of the commit message
    pub summary: String,
    /// Full commit message
    pub message: String,
}

impl CommitInfo {
    /// The primary parent, `None` for root commits.
    pub fn first_parent(&self) -> Option<&Oid> {
        self.parents.first()
    }

    /// Check if this is a root commit.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Description of a commit to be written to the object database.
#[derive(Debug, Clone)]
pub struct NewCommit {
    /// Tree the commit records
    pub tree: Oid,
    /// Parents, first parent first; empty for a root commit
    pub parents: Vec<Oid>,
    /// Author identity
    pub author: Signature,
    /// Committer identity
    pub committer: Signature,
    /// Commit message
    pub message: String,
}

/// Credentials offered to a remote during push.
#[derive(Clone, Default)]
pub enum Credentials {
    /// Offer nothing (local or anonymous remotes).
    #[default]
    None,
    /// HTTPS basic authentication.
    UserPass {
        /// Username sent to the server
        username: String,
        /// Password or access token
        password: String,
    },
    /// Keys held by the running SSH agent.
    SshAgent,
}

// Custom Debug to avoid exposing the password
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::UserPass { username, .. } => f
                .debug_struct("UserPass")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::SshAgent => f.write_str("SshAgent"),
        }
    }
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. No other module
/// imports `git2`.
///
/// # CAS Semantics
///
/// Ref mutations use libgit2's conditional reference write, so the
/// comparison against the expected old value and the write happen under
/// the same ref lock.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

/// Convert a validated Oid into git2's representation.
fn to_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}

/// Convert a git2 Oid into the validated type.
fn from_git2_oid(oid: git2::Oid) -> Result<Oid, GitError> {
    Oid::new(oid.to_string()).map_err(GitError::from)
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the repository. Bare repositories are accepted: hooks run
    /// inside them on the server side.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    /// Get repository information.
    pub fn info(&self) -> RepoInfo {
        RepoInfo {
            git_dir: self.repo.path().to_path_buf(),
            work_dir: self.repo.workdir().map(Path::to_path_buf),
        }
    }

    /// Get direct access to the git directory path.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve a ref to the commit it points at.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the ref doesn't exist
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        let reference = self
            .repo
            .find_reference(refname)
            .map_err(|e| GitError::from_git2(e, refname))?;

        let commit = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, refname))?;

        from_git2_oid(commit.id())
    }

    /// Resolve a ref, returning None if it doesn't exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.resolve_ref(refname) {
            Ok(oid) => Ok(Some(oid)),
            Err(GitError::RefNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve the tip commit of a local branch.
    pub fn branch_tip(&self, branch: &BranchName) -> Result<Oid, GitError> {
        self.resolve_ref(&format!("refs/heads/{}", branch))
    }

    /// Resolve any revision expression (full or abbreviated hash, ref name,
    /// `HEAD~2`, ...) to a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::RevisionNotFound`] if nothing matches, or an
    ///   abbreviation is ambiguous
    /// - [`GitError::NotACommit`] if the match is not a commit (a tree, say)
    pub fn resolve_commit(&self, spec: &str) -> Result<Oid, GitError> {
        let object = self.repo.revparse_single(spec).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound
            | git2::ErrorCode::InvalidSpec
            | git2::ErrorCode::Ambiguous => GitError::RevisionNotFound {
                spec: spec.to_string(),
            },
            _ => GitError::from_git2(e, spec),
        })?;

        let commit = object.peel_to_commit().map_err(|e| match e.code() {
            git2::ErrorCode::InvalidSpec | git2::ErrorCode::Peel => GitError::NotACommit {
                spec: spec.to_string(),
            },
            _ => GitError::from_git2(e, spec),
        })?;

        from_git2_oid(commit.id())
    }

    /// Check if a ref exists.
    pub fn ref_exists(&self, refname: &str) -> bool {
        self.repo.find_reference(refname).is_ok()
    }

    /// List all local branches.
    ///
    /// Branches whose names fail validation are skipped.
    pub fn list_branches(&self) -> Result<Vec<BranchName>, GitError> {
        let branches = self
            .repo
            .branches(Some(git2::BranchType::Local))
            .map_err(|e| GitError::from_git2(e, "branches"))?;

        let mut names = Vec::new();
        for branch in branches {
            let (branch, _) = branch.map_err(|e| GitError::from_git2(e, "branches"))?;
            if let Some(Ok(name)) = branch.name().ok().flatten().map(BranchName::new) {
                names.push(name);
            }
        }
        names.sort();

        Ok(names)
    }

    // =========================================================================
    // Commits
    // =========================================================================

    /// Read a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the commit doesn't exist
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self
            .repo
            .find_commit(to_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let parents = commit
            .parent_ids()
            .map(from_git2_oid)
            .collect::<Result<Vec<_>, _>>()?;
        let author = Signature::from_git2(&commit.author());
        let committer = Signature::from_git2(&commit.committer());

        Ok(CommitInfo {
            oid: oid.clone(),
            tree: from_git2_oid(commit.tree_id())?,
            parents,
            author,
            committer,
            summary: commit.summary().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
        })
    }

    /// Write a commit object without moving any ref.
    ///
    /// The new commit is unreachable until a ref is pointed at it.
    pub fn create_commit(&self, commit: &NewCommit) -> Result<Oid, GitError> {
        let tree = self
            .repo
            .find_tree(to_git2_oid(&commit.tree)?)
            .map_err(|e| GitError::from_git2(e, commit.tree.as_str()))?;

        let parents = commit
            .parents
            .iter()
            .map(|oid| {
                self.repo
                    .find_commit(to_git2_oid(oid)?)
                    .map_err(|e| GitError::from_git2(e, oid.as_str()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        let oid = self
            .repo
            .commit(
                None,
                &commit.author.to_git2()?,
                &commit.committer.to_git2()?,
                &commit.message,
                &tree,
                &parent_refs,
            )
            .map_err(|e| GitError::from_git2(e, "commit"))?;

        from_git2_oid(oid)
    }

    // =========================================================================
    // Ancestry Queries
    // =========================================================================

    /// Check if `candidate` is reachable from `tip` through any parent path.
    ///
    /// A commit is its own ancestor. The walk follows every parent of
    /// every merge, so commits that only live on a merged side branch are
    /// found too.
    ///
    /// # Errors
    ///
    /// - [`GitError::Io`] if a commit in the history cannot be read
    pub fn is_ancestor(&self, candidate: &Oid, tip: &Oid) -> Result<bool, GitError> {
        if candidate == tip {
            return Ok(true);
        }

        let target = to_git2_oid(candidate)?;
        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| GitError::from_git2(e, "revwalk"))?;
        revwalk
            .push(to_git2_oid(tip)?)
            .map_err(|e| GitError::from_git2(e, tip.as_str()))?;

        for oid in revwalk {
            let oid = oid.map_err(|e| GitError::Io {
                message: format!("walking history of {}: {}", tip, e.message()),
            })?;
            if oid == target {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Count commits reachable from `tip`, excluding those reachable from
    /// `exclude` when given.
    pub fn commit_count(&self, tip: &Oid, exclude: Option<&Oid>) -> Result<usize, GitError> {
        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| GitError::from_git2(e, "revwalk"))?;
        revwalk
            .push(to_git2_oid(tip)?)
            .map_err(|e| GitError::from_git2(e, tip.as_str()))?;
        if let Some(exclude) = exclude {
            revwalk
                .hide(to_git2_oid(exclude)?)
                .map_err(|e| GitError::from_git2(e, exclude.as_str()))?;
        }

        let mut count = 0;
        for oid in revwalk {
            oid.map_err(|e| GitError::Io {
                message: format!("walking history of {}: {}", tip, e.message()),
            })?;
            count += 1;
        }
        Ok(count)
    }

    // =========================================================================
    // CAS Ref Operations
    // =========================================================================

    /// Update a ref with compare-and-swap semantics.
    ///
    /// The update only succeeds if the ref's current value matches
    /// `expected_old`. If `expected_old` is `None`, the ref must not exist
    /// (create case).
    ///
    /// # Errors
    ///
    /// - [`GitError::CasFailed`] if the current value doesn't match expected
    /// - [`GitError::Locked`] if another writer holds the ref lock
    /// - [`GitError::Io`] if the ref could not be written
    pub fn update_ref_cas(
        &self,
        refname: &str,
        new_oid: &Oid,
        expected_old: Option<&Oid>,
        message: &str,
    ) -> Result<(), GitError> {
        let new = to_git2_oid(new_oid)?;

        let result = match expected_old {
            Some(expected) => {
                let current = to_git2_oid(expected)?;
                self.repo
                    .reference_matching(refname, new, true, current, message)
            }
            None => self.repo.reference(refname, new, false, message),
        };

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::Modified | git2::ErrorCode::Exists
                ) || (expected_old.is_some() && e.code() == git2::ErrorCode::NotFound) =>
            {
                Err(GitError::CasFailed {
                    refname: refname.to_string(),
                    expected: expected_old
                        .map(Oid::to_string)
                        .unwrap_or_else(|| "<none>".to_string()),
                    actual: self
                        .try_resolve_ref_raw(refname)?
                        .unwrap_or_else(|| "<none>".to_string()),
                })
            }
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    /// Try to resolve a ref to its raw OID string (without peeling).
    fn try_resolve_ref_raw(&self, refname: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_reference(refname) {
            Ok(reference) => {
                let resolved = reference.resolve().map_err(|e| GitError::from_git2(e, refname))?;
                Ok(resolved.target().map(|oid| oid.to_string()))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Write string entries to the repository's local config file.
    ///
    /// Entries are written in order; the first failure stops the batch.
    pub fn set_config_entries(&self, entries: &[(String, String)]) -> Result<(), GitError> {
        let config = self
            .repo
            .config()
            .map_err(|e| GitError::from_git2(e, "config"))?;
        let mut local = config
            .open_level(git2::ConfigLevel::Local)
            .map_err(|e| GitError::from_git2(e, "config"))?;

        for (key, value) in entries {
            local
                .set_str(key, value)
                .map_err(|e| GitError::from_git2(e, key))?;
        }
        Ok(())
    }

    /// Read a string entry from the repository config.
    pub fn config_string(&self, key: &str) -> Result<Option<String>, GitError> {
        let config = self
            .repo
            .config()
            .map_err(|e| GitError::from_git2(e, "config"))?;
        match config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, key)),
        }
    }

    // =========================================================================
    // Remote Operations
    // =========================================================================

    /// Get the URL for a remote.
    ///
    /// Returns `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, name)),
        }
    }

    /// Push refspecs to a configured remote.
    ///
    /// Every ref the server refuses is reported; the first refusal becomes
    /// [`GitError::PushRejected`].
    pub fn push(
        &self,
        remote: &str,
        refspecs: &[String],
        credentials: &Credentials,
    ) -> Result<(), GitError> {
        let mut remote_handle = self.repo.find_remote(remote).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::RemoteNotFound {
                    name: remote.to_string(),
                }
            } else {
                GitError::from_git2(e, remote)
            }
        })?;

        let attempts = Cell::new(0usize);
        let rejected: RefCell<Vec<(String, String)>> = RefCell::new(Vec::new());

        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed| {
            attempts.set(attempts.get() + 1);
            if attempts.get() > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("credentials rejected by remote"));
            }
            match credentials {
                Credentials::UserPass { username, password }
                    if allowed.contains(git2::CredentialType::USER_PASS_PLAINTEXT) =>
                {
                    git2::Cred::userpass_plaintext(username, password)
                }
                Credentials::SshAgent if allowed.contains(git2::CredentialType::SSH_KEY) => {
                    git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
                }
                _ => Err(git2::Error::from_str("no usable credentials for remote")),
            }
        });
        callbacks.push_update_reference(|refname, status| {
            if let Some(message) = status {
                rejected
                    .borrow_mut()
                    .push((refname.to_string(), message.to_string()));
            }
            Ok(())
        });

        let mut options = git2::PushOptions::new();
        options.remote_callbacks(callbacks);

        tracing::debug!(remote, refs = refspecs.len(), "pushing");
        remote_handle
            .push(refspecs, Some(&mut options))
            .map_err(|e| GitError::from_git2(e, remote))?;

        if let Some((refname, message)) = rejected.borrow().first() {
            return Err(GitError::PushRejected {
                refname: refname.clone(),
                message: message.clone(),
            });
        }
        Ok(())
    }
}
