//! auth command - Store, inspect or remove the forge token
//!
//! The token value is never written to stdout, stderr or the log. Status
//! output only says whether a token is available and where it comes from.

use std::io::{self, Write};

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::config::Config;
use crate::secrets::{self, SecretStore, TokenSource, GITHUB_TOKEN_KEY, TOKEN_ENV};

/// Run the auth command.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `token` - Token given with `--token`; prompted for when `None`
/// * `status` - Report whether a token is available
/// * `logout` - Remove the stored token
pub fn auth(ctx: &Context, token: Option<&str>, status: bool, logout: bool) -> Result<()> {
    let config = Config::load(None).context("Failed to load configuration")?;
    let store = secrets::create_store(config.secrets_provider())
        .context("Failed to initialize secret store")?;

    if status {
        return show_status(store.as_ref(), ctx.quiet);
    }
    if logout {
        return logout_store(store.as_ref(), ctx.quiet);
    }

    let value = read_token(ctx, token)?;
    validate_token(&value)?;
    store
        .set(GITHUB_TOKEN_KEY, &value)
        .context("Failed to store token")?;
    tracing::debug!(provider = config.secrets_provider(), "token stored");

    if !ctx.quiet {
        println!("Token stored.");
        if std::env::var_os(TOKEN_ENV).is_some() {
            println!("Note: {} is set and takes precedence.", TOKEN_ENV);
        }
    }
    Ok(())
}

fn show_status(store: &dyn SecretStore, quiet: bool) -> Result<()> {
    let resolved = secrets::resolve_token(store).context("Failed to read secret store")?;
    let source = resolved.map(|(_, source)| source);

    if quiet {
        println!(
            "{}",
            if source.is_some() {
                "authenticated"
            } else {
                "not_authenticated"
            }
        );
        return Ok(());
    }

    match source {
        Some(TokenSource::Environment) => println!("Authenticated (token from {}).", TOKEN_ENV),
        Some(TokenSource::Store) => println!("Authenticated (stored token)."),
        None => {
            println!("Not authenticated.");
            println!("Run 'githook auth' or set {}.", TOKEN_ENV);
        }
    }
    Ok(())
}

fn logout_store(store: &dyn SecretStore, quiet: bool) -> Result<()> {
    store
        .delete(GITHUB_TOKEN_KEY)
        .context("Failed to remove stored token")?;
    if !quiet {
        println!("Stored token removed.");
    }
    Ok(())
}

fn read_token(ctx: &Context, token: Option<&str>) -> Result<String> {
    if let Some(t) = token {
        return Ok(t.trim().to_string());
    }
    if !ctx.interactive {
        bail!("Token required. Use --token <TOKEN> or run interactively.");
    }

    print!("GitHub personal access token: ");
    io::stdout().flush()?;
    let value = rpassword::read_password().context("Failed to read token")?;
    Ok(value.trim().to_string())
}

/// Shape checks only; the forge is not contacted.
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        bail!("Token cannot be empty.");
    }
    if token.len() < 10 {
        bail!("Token appears to be too short.");
    }
    if token.chars().any(char::is_whitespace) {
        bail!("Token should not contain whitespace.");
    }
    Ok(())
}
