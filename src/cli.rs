//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `mpdgrep` binary. The query is taken as
//! trailing positional arguments exactly as the shell split them; re-quoting
//! ([`crate::requote`]) happens before parsing, so
//! `mpdgrep search %title% like "Q u o t e d"` works without escaping.
//!
//! ## Examples
//!
//! ```bash
//! mpdgrep search '<artist>==foobar'
//! mpdgrep search --add '<artist>|<album>' like blue
//! mpdgrep parse '<a>&<b>' =i= x
//! ```

use clap::{Parser, Subcommand, ValueEnum};

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser)]
#[command(name = "mpdgrep")]
#[command(about = "Search the MPD database with a small boolean tag query language")]
#[command(version)]
pub struct Args {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Search the MPD database
    ///
    /// Evaluates a tag query against the running MPD instance and prints the
    /// matching files in discovery order. Queries combine tag comparisons
    /// with and/or: `<artist>==foobar`, `<artist>|<album> like blue`, or just
    /// a bare word to search every tag. A query the grammar cannot parse is
    /// treated as a plain substring search over all tags.
    Search {
        /// Query, as split by the shell
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,

        /// Add matches to the play queue and print their queue ids
        #[arg(long)]
        add: bool,

        /// Evaluate with one MPD lookup per query clause instead of scanning
        /// a local snapshot
        #[arg(long)]
        indexed: bool,

        /// Scan a fresh snapshot from MPD, bypassing the on-disk cache
        #[arg(long, conflicts_with = "indexed")]
        no_cache: bool,

        /// Print full records as JSON instead of file paths
        #[arg(long)]
        json: bool,
    },

    /// Print the parsed and normalized form of a query
    ///
    /// Debug aid: shows how the grammar reads a query and what it unfolds to.
    /// Exits 0 whether or not the query used the substring fallback.
    Parse {
        /// Query, as split by the shell
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },

    /// Generate shell completions
    ///
    /// Usage: mpdgrep completion bash > ~/.local/share/bash-completion/completions/mpdgrep
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}
