//! squash command - Collapse a commit range on a branch into one commit

use anyhow::{anyhow, Context as _, Result};

use crate::cli::Context;
use crate::core::types::{BranchName, Oid};
use crate::squash::{self, SquashOutcome, SquashRequest};

/// Squash `start..=tip` on `branch`.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `branch` - Branch to rewrite
/// * `start` - First commit of the range
/// * `message` - Message of the squashed commit
/// * `expected_tip` - Tip to squash up to and guard the update with
/// * `json` - Print the outcome as JSON
pub fn squash(
    ctx: &Context,
    branch: &str,
    start: &str,
    message: &str,
    expected_tip: Option<&str>,
    json: bool,
) -> Result<()> {
    let branch = BranchName::new(branch).context("Invalid branch name")?;
    let expected_tip = expected_tip
        .map(Oid::new)
        .transpose()
        .context("--expected-tip must be a full commit id")?;

    let git = ctx.open_repo()?;

    let mut request = SquashRequest::new(branch, start, message);
    request.expected_tip = expected_tip;

    let outcome = squash::run(&git, &request).map_err(|e| {
        let hint = if e.is_retryable() {
            " (transient; retrying may succeed)"
        } else {
            ""
        };
        anyhow!(e).context(format!("Squash of {} failed{}", request.branch, hint))
    })?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialize result")?
        );
    } else if !ctx.quiet {
        println!("{}", summary(&outcome));
    }

    Ok(())
}

fn summary(outcome: &SquashOutcome) -> String {
    let plural = if outcome.squashed_count == 1 { "" } else { "s" };
    format!(
        "Squashed {} commit{} on {}: {} -> {}",
        outcome.squashed_count,
        plural,
        outcome.branch,
        outcome.previous_tip.short(7),
        outcome.squashed.short(7)
    )
}
