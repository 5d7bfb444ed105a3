//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! Each handler validates its arguments, calls into the library and prints
//! the result. Errors are returned as `anyhow::Error` with context; `main`
//! prints them and exits non-zero.
//!
//! # Async Commands
//!
//! `setup-remote` talks to the forge over HTTP. It builds a tokio runtime
//! for that call only; everything else is synchronous.

mod auth;
mod completion;
mod setup_remote;
mod squash;

pub use auth::auth;
pub use completion::completion;
pub use setup_remote::setup_remote;
pub use squash::squash;

use crate::cli::args::Command;
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Squash {
            branch,
            start,
            message,
            expected_tip,
            json,
        } => squash::squash(
            ctx,
            &branch,
            &start,
            &message,
            expected_tip.as_deref(),
            json,
        ),
        Command::SetupRemote {
            name,
            remote,
            private,
            public,
            description,
            protocol,
        } => {
            let visibility = match (private, public) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            setup_remote::setup_remote(
                ctx,
                setup_remote::SetupArgs {
                    name,
                    remote,
                    private: visibility,
                    description,
                    protocol: protocol.map(Into::into),
                },
            )
        }
        Command::Auth {
            token,
            status,
            logout,
        } => auth::auth(ctx, token.as_deref(), status, logout),
        Command::Completion { shell } => completion::completion(shell),
    }
}
