//! githook - repository maintenance operations for git hooks
//!
//! githook rewrites and publishes repositories from the server side of a
//! push: it squashes a range of commits on a branch into a single commit,
//! and it creates a forge repository for a local one and pushes every
//! branch to it.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to the library)
//! - [`core`] - Validated domain types and configuration
//! - [`git`] - Single interface for all Git operations
//! - [`squash`] - Commit squashing with a compare-and-swap branch update
//! - [`forge`] - Abstraction for remote forges (GitHub)
//! - [`remote`] - Forge repository creation, remote configuration and push
//! - [`secrets`] - Secret storage for the forge token
//!
//! # Invariants
//!
//! 1. A branch is only moved if it still points at the commit that was read
//! 2. Squashing never deletes objects; the replaced commits stay in the
//!    object database
//! 3. Tokens never appear in output, logs or error messages

pub mod cli;
pub mod core;
pub mod forge;
pub mod git;
pub mod remote;
pub mod secrets;
pub mod squash;
