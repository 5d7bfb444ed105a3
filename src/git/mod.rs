//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. All repository reads and writes
//! flow through this interface. No other module should import `git2`.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening (bare repositories included)
//! - Revision resolution and commit reads
//! - Ancestry queries across every parent of every merge
//! - Commit creation without ref side effects
//! - CAS ref updates
//! - Local config edits and pushes to remotes
//!
//! # Invariants
//!
//! - All ref updates use CAS (compare-and-swap) semantics
//! - No other module calls git2 directly
//! - All operations return strong types (Oid, BranchName)
//!
//! # Example
//!
//! ```ignore
//! use githook::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//!
//! let tip = git.resolve_ref("refs/heads/main")?;
//! let start = git.resolve_commit("HEAD~3")?;
//! assert!(git.is_ancestor(&start, &tip)?);
//!
//! // CAS update (fails if ref changed since read)
//! git.update_ref_cas("refs/heads/main", &new_oid, Some(&tip), "githook: squash")?;
//! ```

mod interface;

pub use interface::{
    CommitInfo, Credentials, Git, GitError, NewCommit, RepoInfo, Signature,
};
