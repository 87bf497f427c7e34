//! # mpdgrep - Query-Language Search for MPD
//!
//! Searches the music-player-daemon database with a small boolean tag query
//! language and prints matching files, optionally enqueuing them.
//!
//! ## Usage
//!
//! ```bash
//! # Exact tag search
//! mpdgrep search '<artist>==foobar'
//!
//! # Substring over artist or album, enqueue the matches
//! mpdgrep search --add '<artist>|<album>' like blue
//!
//! # See how a query parses and unfolds
//! mpdgrep parse '<artist>&<albumartist>' =i= "Miles Davis"
//! ```
//!
//! ## Logging
//!
//! `RUST_LOG=debug mpdgrep ...` shows requoting, parse fallbacks, cache
//! decisions and mpc invocations.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use log::{debug, info};

use mpdgrep::{cache, cli, completion, config, eval, normalize, parser, provider, requote, resolve};

fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Search {
            query,
            add,
            indexed,
            no_cache,
            json,
        } => {
            let text = requote::requote(&query);
            debug!("requoted query: {text}");
            run_search(&text, add, indexed, no_cache, json)?;
        }
        cli::Command::Parse { query } => {
            let text = requote::requote(&query);
            let parsed = parser::parse_or_fallback(&text);
            println!("parsed:     {parsed}");
            println!("normalized: {}", normalize::normalize(parsed));
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(&shell), &mut cmd);
        }
    }

    Ok(())
}

fn run_search(text: &str, add: bool, indexed: bool, no_cache: bool, json: bool) -> Result<()> {
    let cfg = config::RuntimeConfig::from_env()?;
    let mut mpd = provider::MpcProvider::new(cfg.mpd_host.clone(), cfg.mpd_port.clone());
    mpd.check_connection()?;

    let expr = normalize::normalize(parser::parse_or_fallback(text));
    debug!("normalized query: {expr}");

    let results = if indexed {
        eval::evaluate(&expr, &mpd, eval::Strategy::Indexed)?
    } else if no_cache {
        eval::evaluate(&expr, &mpd, eval::Strategy::Scan)?
    } else {
        let snapshot = cache::load(&cfg.cache_path, &mpd)?;
        eval::scan(&expr, &snapshot)
    };
    info!("{} matching songs", results.len());

    if add {
        let entries = resolve::resolve_ids(results, &mut mpd)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            for entry in &entries {
                let marker = if entry.added { "+" } else { " " };
                let file = entry.record.file().unwrap_or("?");
                println!("{}{:>4}  {}", marker, entry.id, file);
            }
        }
    } else if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for record in &results {
            if let Some(file) = record.file() {
                println!("{file}");
            }
        }
    }

    Ok(())
}
