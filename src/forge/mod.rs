//! forge
//!
//! Abstraction for remote forges (GitHub).
//!
//! # Architecture
//!
//! The `Forge` trait defines the interface for interacting with remote
//! hosting services. Commands use the [`create_forge`] factory function
//! rather than importing specific forge implementations directly.
//!
//! Forge failures never compromise local state: remote setup only touches
//! the repository after the forge has created the remote repository.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and request/response types
//! - [`github`]: GitHub implementation using the REST API
//! - [`mock`]: Mock implementation for deterministic testing
//! - `factory`: Forge selection and creation

mod factory;
pub mod github;
pub mod mock;
mod traits;

pub use factory::{create_forge, valid_forge_names, ForgeProvider, ForgeSettings};
pub use traits::*;
