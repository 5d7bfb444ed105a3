//! squash::error
//!
//! Failure taxonomy for the squash operation.

use thiserror::Error;

use crate::core::types::{BranchName, Oid};
use crate::git::GitError;

/// Errors from a squash.
///
/// Every variant names the branch and the commit ids involved so that a
/// hook can print a useful rejection without re-reading the repository.
/// None of these are retried internally.
#[derive(Debug, Error)]
pub enum SquashError {
    /// The branch or the start revision did not resolve to a commit.
    #[error("cannot resolve {revision} on branch {branch}: {message}")]
    RefResolution {
        /// Branch being squashed
        branch: BranchName,
        /// The name or expression that failed to resolve
        revision: String,
        /// Underlying reason
        message: String,
    },

    /// The start commit exists but is not reachable from the branch tip.
    #[error("commit {start} is not in the history of {branch} (tip {tip})")]
    HistoryNotFound {
        /// Branch being squashed
        branch: BranchName,
        /// The resolved start commit
        start: Oid,
        /// The tip that was searched from
        tip: Oid,
    },

    /// Reading the repository failed.
    #[error("repository read failed while squashing {branch}: {message}")]
    RepositoryIo {
        /// Branch being squashed
        branch: BranchName,
        /// Underlying reason
        message: String,
    },

    /// The new commit object could not be written.
    #[error("could not write squashed commit for {branch}: {message}")]
    ObjectWrite {
        /// Branch being squashed
        branch: BranchName,
        /// Underlying reason
        message: String,
    },

    /// The branch ref could not be locked for the update.
    #[error("could not lock {branch} to move it to {squashed}: {message}")]
    LockFailure {
        /// Branch being squashed
        branch: BranchName,
        /// The commit the branch should have moved to
        squashed: Oid,
        /// Underlying reason
        message: String,
    },

    /// The branch moved between the read and the write.
    #[error("{branch} moved during squash: expected {expected}, found {actual}")]
    ConcurrentUpdate {
        /// Branch being squashed
        branch: BranchName,
        /// Tip observed when the squash started
        expected: Oid,
        /// Value found at write time
        actual: String,
    },

    /// The commit message is empty.
    #[error("squash message for {branch} is empty")]
    InvalidMessage {
        /// Branch being squashed
        branch: BranchName,
    },
}

impl SquashError {
    /// Whether running the same squash again might succeed.
    ///
    /// True for transient storage and lock failures. A concurrent update is
    /// not retryable as-is: the caller has to look at the new tip first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SquashError::RepositoryIo { .. } | SquashError::LockFailure { .. }
        )
    }

    /// The branch this error is about.
    pub fn branch(&self) -> &BranchName {
        match self {
            SquashError::RefResolution { branch, .. }
            | SquashError::HistoryNotFound { branch, .. }
            | SquashError::RepositoryIo { branch, .. }
            | SquashError::ObjectWrite { branch, .. }
            | SquashError::LockFailure { branch, .. }
            | SquashError::ConcurrentUpdate { branch, .. }
            | SquashError::InvalidMessage { branch } => branch,
        }
    }

    /// Classify a failure to resolve `revision`.
    ///
    /// Lookup failures become [`SquashError::RefResolution`]; storage
    /// failures become [`SquashError::RepositoryIo`].
    pub(crate) fn resolution(branch: &BranchName, revision: &str, err: GitError) -> Self {
        match err {
            GitError::Io { .. } | GitError::Internal { .. } => SquashError::RepositoryIo {
                branch: branch.clone(),
                message: err.to_string(),
            },
            other => SquashError::RefResolution {
                branch: branch.clone(),
                revision: revision.to_string(),
                message: other.to_string(),
            },
        }
    }

    pub(crate) fn io(branch: &BranchName, err: GitError) -> Self {
        SquashError::RepositoryIo {
            branch: branch.clone(),
            message: err.to_string(),
        }
    }
}
