//! Search the MPD database with a small boolean tag query language.
//!
//! Core modules:
//! - [`parser`] - Tokenizer and grammar for the query language
//! - [`ast`] - Typed, immutable query tree nodes
//! - [`normalize`] - Default filling and tag-set unfolding
//! - [`eval`] - Set-algebra evaluation (linear scan or indexed lookups)
//! - [`provider`] - Record providers: `mpc`-backed and in-memory
//!
//! ### Supporting Modules
//!
//! - [`record`] - Tagged records and multi-value coercion
//! - [`cache`] - SQLite snapshot cache of the MPD database
//! - [`resolve`] - Mapping results onto the play queue
//! - [`requote`] - Restoring quoting eaten by the invoking shell
//! - [`config`] - Data directory and MPD connection settings
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```
//! use mpdgrep::eval::{search, Strategy};
//! use mpdgrep::provider::MemoryProvider;
//! use mpdgrep::record::Record;
//!
//! let provider = MemoryProvider::new(vec![
//!     Record::from_pairs(&[
//!         ("file", "miles/kob/01.flac"),
//!         ("artist", "Miles Davis"),
//!         ("album", "Kind of Blue"),
//!     ]),
//! ]);
//!
//! let results = search("<artist>|<album> like blue", &provider, Strategy::Scan)?;
//! assert_eq!(results[0].file(), Some("miles/kob/01.flac"));
//! # Ok::<(), mpdgrep::provider::ProviderError>(())
//! ```
//!
//! ## Query Language
//!
//! A query is a boolean combination of comparisons. Each comparison applies
//! one operator to one literal over a set of tags:
//!
//! - `<artist>==foobar` — byte-exact match on one tag
//! - `<artist>=i=FooBar` — case-insensitive exact match
//! - `<artist> like foo` — case-insensitive substring match
//! - `foo` — bare literal, searches every tag with `like`
//! - `<artist>|<album> == X` — tag-set, unfolds to an `or` of comparisons
//! - `a and b`, `a or b`, `(a or b) and c` — boolean combinators, with
//!   `&`/`&&`/`|`/`||` spellings and `(...)`/`[...]`/`{...}` grouping
//!
//! Anything the grammar rejects degrades to a substring search over every
//! tag, so old-style `mpdgrep some words` invocations keep working.
//!
//! ## Error Handling
//!
//! Library calls return [`provider::ProviderError`] when MPD itself is the
//! problem; parse failures never surface from a search (the fallback handles
//! them) but are available from [`parser::parse`] as
//! [`parser::ParseError`]. The binary wraps everything in `anyhow::Result`
//! for context-rich reporting.

pub mod ast;
pub mod cache;
pub mod cli;
pub mod completion;
pub mod config;
pub mod eval;
pub mod normalize;
pub mod parser;
pub mod provider;
pub mod record;
pub mod requote;
pub mod resolve;

pub use ast::{CompareOp, Comparison, Expr, TagSet};
pub use eval::{evaluate, matches, scan, search, Strategy};
pub use normalize::normalize;
pub use parser::{parse, parse_or_fallback, ParseError};
pub use provider::{MemoryProvider, MpcProvider, ProviderError, RecordProvider};
pub use record::{Record, TagValue};
pub use requote::requote;
pub use resolve::{resolve_ids, QueueEntry};
