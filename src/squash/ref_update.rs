//! squash::ref_update
//!
//! Guarded branch repoint.

use crate::core::types::{BranchName, Oid, RefName};
use crate::git::{Git, GitError};

use super::SquashError;

/// Result of attempting to repoint a branch.
///
/// Every outcome leaves the object database untouched; only `Updated`
/// changes the ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefUpdateOutcome {
    /// The branch now points at the new commit.
    Updated,
    /// The branch no longer pointed at the expected tip.
    ConcurrentUpdate {
        /// Tip the caller observed
        expected: Oid,
        /// What the branch held at write time (`<none>` if deleted)
        actual: String,
    },
    /// Another writer holds the ref lock.
    LockContention {
        /// libgit2's description
        message: String,
    },
    /// The ref could not be written for any other reason.
    IoError {
        /// Description of the failure
        message: String,
    },
}

impl RefUpdateOutcome {
    /// Whether the branch was moved.
    pub fn is_updated(&self) -> bool {
        matches!(self, RefUpdateOutcome::Updated)
    }

    /// Convert into the squash error taxonomy.
    pub fn into_result(self, branch: &BranchName, squashed: &Oid) -> Result<(), SquashError> {
        match self {
            RefUpdateOutcome::Updated => Ok(()),
            RefUpdateOutcome::ConcurrentUpdate { expected, actual } => {
                Err(SquashError::ConcurrentUpdate {
                    branch: branch.clone(),
                    expected,
                    actual,
                })
            }
            RefUpdateOutcome::LockContention { message } => Err(SquashError::LockFailure {
                branch: branch.clone(),
                squashed: squashed.clone(),
                message,
            }),
            RefUpdateOutcome::IoError { message } => Err(SquashError::RepositoryIo {
                branch: branch.clone(),
                message,
            }),
        }
    }
}

/// Point `branch` at `new` if and only if it still points at `expected`.
pub fn update_branch(
    git: &Git,
    branch: &BranchName,
    new: &Oid,
    expected: &Oid,
    reflog: &str,
) -> RefUpdateOutcome {
    let refname = RefName::for_branch(branch);

    match git.update_ref_cas(refname.as_str(), new, Some(expected), reflog) {
        Ok(()) => RefUpdateOutcome::Updated,
        Err(GitError::CasFailed { actual, .. }) => RefUpdateOutcome::ConcurrentUpdate {
            expected: expected.clone(),
            actual,
        },
        Err(GitError::Locked { message, .. }) => RefUpdateOutcome::LockContention { message },
        Err(other) => RefUpdateOutcome::IoError {
            message: other.to_string(),
        },
    }
}
