//! completion command - Generate shell completion scripts

use std::io::{self, Write};

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{generate, shells, Generator};

use crate::cli::args::{Cli, Shell};

/// Print the completion script for `shell` to stdout.
pub fn completion(shell: Shell) -> Result<()> {
    let stdout = io::stdout();
    write_completion(shell, &mut stdout.lock())?;
    Ok(())
}

fn write_completion(shell: Shell, out: &mut dyn Write) -> io::Result<()> {
    match shell {
        Shell::Bash => render(shells::Bash, out),
        Shell::Zsh => render(shells::Zsh, out),
        Shell::Fish => render(shells::Fish, out),
        Shell::PowerShell => render(shells::PowerShell, out),
    }
    out.flush()
}

fn render<G: Generator>(generator: G, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(generator, &mut cmd, name, out);
}
