//! cli
//!
//! Command-line interface layer for githook.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and credentials
//! - Delegate to the library operations and format their results
//!
//! The CLI layer is thin. Repository changes happen in [`crate::squash`]
//! and [`crate::remote`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::git::Git;

/// Execution context shared by command handlers.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Directory to run in (the process cwd when `None`)
    pub cwd: Option<PathBuf>,
    /// Debug logging requested
    pub debug: bool,
    /// Minimal output
    pub quiet: bool,
    /// Prompts allowed
    pub interactive: bool,
}

impl Context {
    /// Build the context from parsed flags.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            cwd: cli.cwd.clone(),
            debug: cli.debug,
            quiet: cli.quiet,
            interactive: !cli.quiet && std::io::stdin().is_terminal(),
        }
    }

    /// The directory commands operate in.
    pub fn cwd(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(path) => Ok(path.clone()),
            None => std::env::current_dir().context("Failed to determine current directory"),
        }
    }

    /// Open the repository containing [`Context::cwd`].
    pub fn open_repo(&self) -> Result<Git> {
        let cwd = self.cwd()?;
        Git::open(&cwd).with_context(|| format!("Failed to open repository at {}", cwd.display()))
    }
}

/// Run the CLI application with parsed arguments.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context::from_cli(&cli);
    commands::dispatch(cli.command, &ctx)
}
