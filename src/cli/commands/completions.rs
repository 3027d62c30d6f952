//! Shell completions command implementation.

use crate::cli::{Cli, Shell};
use clap::CommandFactory;
use clap_complete::{generate, shells};
use std::io;

/// Write completions for `shell` to stdout.
pub fn execute(shell: &Shell) {
    let mut cmd = Cli::command();
    let out = &mut io::stdout();

    match shell {
        Shell::Bash => generate(shells::Bash, &mut cmd, "dt", out),
        Shell::Zsh => generate(shells::Zsh, &mut cmd, "dt", out),
        Shell::Fish => generate(shells::Fish, &mut cmd, "dt", out),
        Shell::PowerShell => generate(shells::PowerShell, &mut cmd, "dt", out),
        Shell::Elvish => generate(shells::Elvish, &mut cmd, "dt", out),
    }
}
