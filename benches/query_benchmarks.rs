//! # Query Performance Benchmarks
//!
//! Benchmarks for the hot paths of a search: parsing, normalization and
//! evaluation against libraries of a few thousand songs.
//!
//! ```bash
//! cargo bench
//! cargo bench parse
//! cargo bench evaluate
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use mpdgrep::eval::{evaluate, Strategy};
use mpdgrep::normalize::normalize;
use mpdgrep::parser::parse;
use mpdgrep::provider::MemoryProvider;
use mpdgrep::record::Record;

/// Build a synthetic library with enough tag variety to make matching
/// non-trivial.
fn library(songs: usize) -> Vec<Record> {
    (0..songs)
        .map(|i| {
            let file = format!("artist{:02}/album{:02}/{i:04}.flac", i % 40, i % 13);
            let artist = format!("Artist Number {:02}", i % 40);
            let album = format!("Album Number {:02}", i % 13);
            let title = format!("Track {i} of Many");
            Record::from_pairs(&[
                ("file", file.as_str()),
                ("artist", artist.as_str()),
                ("album", album.as_str()),
                ("title", title.as_str()),
                ("genre", if i % 3 == 0 { "Jazz" } else { "Rock" }),
            ])
        })
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for query in [
        "foobar",
        "<artist>==foobar",
        "<artist>|<album>&<albumartist> like \"kind of blue\"",
        "(a or b) and [c or {d and e}] or <genre> =i= jazz",
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(query), query, |b, q| {
            b.iter(|| parse(black_box(q)).unwrap());
        });
    }
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let expr = parse("<artist>|<album>|<albumartist>|<composer> like x and (a or b)").unwrap();
    c.bench_function("normalize", |b| {
        b.iter(|| normalize(black_box(expr.clone())));
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    for songs in [500usize, 5_000] {
        let provider = MemoryProvider::new(library(songs));
        let expr = normalize(parse("<artist>|<album> like \"number 07\" and <genre>==Jazz").unwrap());
        group.bench_with_input(BenchmarkId::new("scan", songs), &provider, |b, p| {
            b.iter(|| evaluate(black_box(&expr), p, Strategy::Scan).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("indexed", songs), &provider, |b, p| {
            b.iter(|| evaluate(black_box(&expr), p, Strategy::Indexed).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_normalize, bench_evaluate);
criterion_main!(benches);
