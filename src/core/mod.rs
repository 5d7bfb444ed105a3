//! core
//!
//! Core domain types and configuration for githook.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, RefName, RepoName
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing

pub mod config;
pub mod types;
