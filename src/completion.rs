//! Shell completion generation via clap_complete.
//!
//! ```bash
//! mpdgrep completion bash > ~/.local/share/bash-completion/completions/mpdgrep
//! mpdgrep completion zsh > ~/.config/zsh/completions/_mpdgrep
//! ```

use crate::cli;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io;

/// Generate shell completions for the given shell onto stdout.
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Map our CLI shell enum to clap_complete's.
pub fn shell_to_completion_shell(shell: &cli::Shell) -> CompletionShell {
    match shell {
        cli::Shell::Bash => CompletionShell::Bash,
        cli::Shell::Zsh => CompletionShell::Zsh,
        cli::Shell::Fish => CompletionShell::Fish,
        cli::Shell::PowerShell => CompletionShell::PowerShell,
        cli::Shell::Elvish => CompletionShell::Elvish,
    }
}
