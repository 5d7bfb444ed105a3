//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// githook - repository maintenance operations for git hooks
#[derive(Parser, Debug)]
#[command(name = "githook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if githook was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging (overrides GITHOOK_LOG)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; never prompt
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collapse a range of commits on a branch into one commit
    #[command(
        name = "squash",
        long_about = "Collapse every commit from --start up to the branch tip into one commit.\n\n\
            The new commit has the tip's tree, the start commit's first parent, and \
            the start commit's author as author and committer. The branch is moved \
            only if it still points at the tip that was read, so a concurrent push \
            makes the squash fail instead of being overwritten. The original commits \
            stay in the repository.",
        after_help = "\
EXAMPLES:
    # Squash the last three commits of main
    githook squash --branch main --start main~2 -m \"Add parser\"

    # From a post-receive hook, pinning the tip that was just pushed
    githook squash --branch \"$branch\" --start \"$first\" --expected-tip \"$newrev\" -m \"$msg\"

EXIT STATUS:
    0  squashed
    1  failed; the branch is unchanged"
    )]
    Squash {
        /// Branch to rewrite
        #[arg(long, short)]
        branch: String,

        /// First commit of the range (hash, abbreviated hash, or ref)
        #[arg(long, short)]
        start: String,

        /// Message of the squashed commit
        #[arg(long, short)]
        message: String,

        /// Squash up to this commit and require the branch to still point at it
        #[arg(long, value_name = "OID")]
        expected_tip: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create the repository on the forge, add it as a remote and push
    #[command(
        name = "setup-remote",
        long_about = "Create a repository on the configured forge and publish this one to it.\n\n\
            The repository is named after the local directory (without a trailing \
            .git) unless --name or the repo config's repo_name says otherwise. The \
            new clone URL is recorded as the remote, every local branch is set to \
            track its namesake there, and all local branches are pushed.",
        after_help = "\
EXAMPLES:
    # Publish the current repository as a private GitHub repository
    githook setup-remote

    # Choose the name and make it public
    githook setup-remote --name service-api --public"
    )]
    SetupRemote {
        /// Repository name on the forge
        #[arg(long)]
        name: Option<String>,

        /// Git remote to configure (default: repo config, then \"origin\")
        #[arg(long)]
        remote: Option<String>,

        /// Create a private repository
        #[arg(long, conflicts_with = "public")]
        private: bool,

        /// Create a public repository
        #[arg(long)]
        public: bool,

        /// Repository description
        #[arg(long)]
        description: Option<String>,

        /// Which clone URL to record as the remote
        #[arg(long, value_enum)]
        protocol: Option<ProtocolArg>,
    },

    /// Store, inspect or remove the forge token
    #[command(
        name = "auth",
        long_about = "Manage the GitHub personal access token.\n\n\
            The token is used to create repositories and, for HTTPS remotes, to \
            push. It is kept in the configured secret store and never printed. \
            GITHOOK_TOKEN, when set, takes precedence over the stored token.",
        after_help = "\
EXAMPLES:
    # Prompt for the token
    githook auth

    # Non-interactive
    githook auth --token \"$TOKEN\"

    # Check status / remove
    githook auth --status
    githook auth --logout"
    )]
    Auth {
        /// Token to store (prompted for when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Show whether a token is available
        #[arg(long, conflicts_with_all = ["token", "logout"])]
        status: bool,

        /// Remove the stored token
        #[arg(long, conflicts_with = "token")]
        logout: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    githook completion bash > ~/.local/share/bash-completion/completions/githook

    # Zsh
    githook completion zsh > \"${fpath[1]}/_githook\""
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Clone URL protocol selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProtocolArg {
    Https,
    Ssh,
}

impl From<ProtocolArg> for crate::forge::Protocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Https => crate::forge::Protocol::Https,
            ProtocolArg::Ssh => crate::forge::Protocol::Ssh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_squash() {
        let cli = Cli::try_parse_from([
            "githook", "squash", "--branch", "main", "--start", "abc123", "-m", "msg",
        ])
        .unwrap();
        match cli.command {
            Command::Squash {
                branch,
                start,
                message,
                expected_tip,
                json,
            } => {
                assert_eq!(branch, "main");
                assert_eq!(start, "abc123");
                assert_eq!(message, "msg");
                assert!(expected_tip.is_none());
                assert!(!json);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn squash_requires_message() {
        assert!(Cli::try_parse_from(["githook", "squash", "--branch", "main", "--start", "x"]).is_err());
    }

    #[test]
    fn private_and_public_conflict() {
        assert!(Cli::try_parse_from(["githook", "setup-remote", "--private", "--public"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["githook", "auth", "--status", "--debug", "--cwd", "/tmp"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.cwd, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn protocol_value() {
        let cli = Cli::try_parse_from(["githook", "setup-remote", "--protocol", "ssh"]).unwrap();
        match cli.command {
            Command::SetupRemote { protocol, .. } => {
                assert_eq!(protocol, Some(ProtocolArg::Ssh));
                assert_eq!(
                    crate::forge::Protocol::from(ProtocolArg::Ssh),
                    crate::forge::Protocol::Ssh
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
