//! squash
//!
//! Collapse a contiguous range of commits on a branch into one commit.
//!
//! # Operation
//!
//! A squash of `branch` from `start` runs in three steps:
//!
//! 1. **Verify** that `start` is reachable from the branch tip through any
//!    parent link ([`verify_start`]).
//! 2. **Build** one commit whose tree is the tip's tree and whose only
//!    parent is the start's first parent ([`build_squashed_commit`]).
//! 3. **Repoint** the branch with compare-and-swap against the tip read in
//!    step 1 ([`update_branch`]).
//!
//! Nothing is locked before step 3. If the branch moves in the meantime
//! the update fails with [`SquashError::ConcurrentUpdate`] and the new
//! commit is left unreferenced. The original commits are never deleted.
//!
//! # Example
//!
//! ```ignore
//! use githook::git::Git;
//! use githook::squash::{self, SquashRequest};
//!
//! let git = Git::open(Path::new("."))?;
//! let request = SquashRequest::new(BranchName::new("main")?, "HEAD~2", "Add parser");
//! let outcome = squash::run(&git, &request)?;
//! println!("{} -> {}", outcome.previous_tip, outcome.squashed);
//! ```

mod error;
mod ref_update;

pub use error::SquashError;
pub use ref_update::{update_branch, RefUpdateOutcome};

use serde::Serialize;

use crate::core::types::{BranchName, Oid};
use crate::git::{CommitInfo, Git, GitError, NewCommit};

/// What to squash.
#[derive(Debug, Clone)]
pub struct SquashRequest {
    /// Branch whose history is rewritten
    pub branch: BranchName,
    /// First commit of the range; any revision expression
    pub start: String,
    /// Message of the squashed commit
    pub message: String,
    /// Tip whose tree is kept and that the branch must still point at.
    ///
    /// The start is always checked against the branch itself. When absent
    /// the branch tip read at the start is used.
    pub expected_tip: Option<Oid>,
}

impl SquashRequest {
    /// Create a request that squashes up to the current branch tip.
    pub fn new(
        branch: BranchName,
        start: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            branch,
            start: start.into(),
            message: message.into(),
            expected_tip: None,
        }
    }

    /// Pin the tip instead of reading it from the branch.
    pub fn with_expected_tip(mut self, tip: Oid) -> Self {
        self.expected_tip = Some(tip);
        self
    }
}

/// A completed squash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SquashOutcome {
    /// The rewritten branch
    pub branch: BranchName,
    /// Tip before the squash; still stored in the repository
    pub previous_tip: Oid,
    /// The new commit the branch now points at
    pub squashed: Oid,
    /// Parent of the new commit, `None` if the range began at a root
    pub parent: Option<Oid>,
    /// Number of commits the range contained
    pub squashed_count: usize,
}

/// Run a squash end to end.
///
/// # Errors
///
/// See [`SquashError`]. On every error the branch is unchanged.
pub fn run(git: &Git, request: &SquashRequest) -> Result<SquashOutcome, SquashError> {
    let branch = &request.branch;

    let branch_tip = git
        .branch_tip(branch)
        .map_err(|e| SquashError::resolution(branch, branch.as_str(), e))?;
    let tip = match &request.expected_tip {
        Some(tip) => git
            .resolve_commit(tip.as_str())
            .map_err(|e| SquashError::resolution(branch, tip.as_str(), e))?,
        None => branch_tip.clone(),
    };
    tracing::debug!(%branch, %branch_tip, tip = %tip, start = %request.start, "squash requested");

    let start = verify_start(git, branch, &request.start, &branch_tip)?;

    let start_info = git
        .commit_info(&start)
        .map_err(|e| SquashError::io(branch, e))?;
    let tip_info = git.commit_info(&tip).map_err(|e| SquashError::io(branch, e))?;

    let squashed = build_squashed_commit(git, branch, &start_info, &tip_info, &request.message)?;
    let parent = start_info.first_parent().cloned();

    let squashed_count = git
        .commit_count(&tip, parent.as_ref())
        .map_err(|e| SquashError::io(branch, e))?;

    let reflog = format!(
        "githook: squash {} commits from {}",
        squashed_count,
        start.short(7)
    );
    update_branch(git, branch, &squashed, &tip, &reflog).into_result(branch, &squashed)?;

    tracing::info!(
        %branch,
        from = %tip,
        to = %squashed,
        commits = squashed_count,
        "squashed branch"
    );

    Ok(SquashOutcome {
        branch: branch.clone(),
        previous_tip: tip,
        squashed,
        parent,
        squashed_count,
    })
}

/// Resolve `start` and confirm it is in the history of `tip`.
///
/// The walk follows every parent, so a commit that only exists on the
/// second-parent side of a merge is found.
///
/// # Errors
///
/// - [`SquashError::RefResolution`] if `start` does not name a commit
/// - [`SquashError::HistoryNotFound`] if it is not reachable from `tip`
/// - [`SquashError::RepositoryIo`] if the walk cannot read a commit
pub fn verify_start(
    git: &Git,
    branch: &BranchName,
    start: &str,
    tip: &Oid,
) -> Result<Oid, SquashError> {
    let resolved = git
        .resolve_commit(start)
        .map_err(|e| SquashError::resolution(branch, start, e))?;

    match git.is_ancestor(&resolved, tip) {
        Ok(true) => {
            tracing::debug!(%branch, start = %resolved, "start commit is in branch history");
            Ok(resolved)
        }
        Ok(false) => Err(SquashError::HistoryNotFound {
            branch: branch.clone(),
            start: resolved,
            tip: tip.clone(),
        }),
        Err(e) => Err(SquashError::io(branch, e)),
    }
}

/// Write the commit that replaces the range `start..=tip`.
///
/// The commit records the tip's tree, the start's first parent (or none for
/// a root start) and the start's author as both author and committer. No
/// ref is touched.
pub fn build_squashed_commit(
    git: &Git,
    branch: &BranchName,
    start: &CommitInfo,
    tip: &CommitInfo,
    message: &str,
) -> Result<Oid, SquashError> {
    if message.trim().is_empty() {
        return Err(SquashError::InvalidMessage {
            branch: branch.clone(),
        });
    }

    if start.parents.len() > 1 {
        let dropped: Vec<&str> = start.parents[1..].iter().map(Oid::as_str).collect();
        tracing::warn!(
            %branch,
            start = %start.oid,
            dropped = ?dropped,
            "start commit is a merge; only its first parent is kept"
        );
    }

    let commit = NewCommit {
        tree: tip.tree.clone(),
        parents: start.first_parent().cloned().into_iter().collect(),
        author: start.author.clone(),
        committer: start.author.clone(),
        message: message.to_string(),
    };

    let oid = git.create_commit(&commit).map_err(|e| match e {
        GitError::ObjectNotFound { .. } => SquashError::RepositoryIo {
            branch: branch.clone(),
            message: e.to_string(),
        },
        other => SquashError::ObjectWrite {
            branch: branch.clone(),
            message: other.to_string(),
        },
    })?;

    tracing::debug!(%branch, squashed = %oid, tree = %tip.tree, "wrote squashed commit");
    Ok(oid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder() {
        let tip = Oid::new("a".repeat(40)).unwrap();
        let request = SquashRequest::new(BranchName::new("main").unwrap(), "HEAD~1", "msg")
            .with_expected_tip(tip.clone());
        assert_eq!(request.start, "HEAD~1");
        assert_eq!(request.expected_tip, Some(tip));
    }

    #[test]
    fn outcome_serializes_ids_as_strings() {
        let outcome = SquashOutcome {
            branch: BranchName::new("main").unwrap(),
            previous_tip: Oid::new("a".repeat(40)).unwrap(),
            squashed: Oid::new("b".repeat(40)).unwrap(),
            parent: None,
            squashed_count: 3,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["branch"], "main");
        assert_eq!(json["squashed"], "b".repeat(40));
        assert!(json["parent"].is_null());
        assert_eq!(json["squashed_count"], 3);
    }
}
