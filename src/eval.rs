//! # Query Evaluation
//!
//! Walks a normalized query tree against a record source, combining per-clause
//! results with set algebra: intersection for `and`, union for `or`.
//!
//! Two functionally equivalent strategies exist, chosen by the environment:
//!
//! - [`Strategy::Scan`] filters a full in-memory snapshot with the
//!   [`matches`] predicate. Best when a snapshot is already at hand (see
//!   [`crate::cache`]).
//! - [`Strategy::Indexed`] issues one provider lookup per leaf comparison —
//!   exact operators route to `find`, substring operators to `search` — and
//!   combines the returned file-identifier sets bottom-up. Every returned
//!   record is re-checked with the same [`matches`] predicate, so the two
//!   strategies cannot disagree on membership.
//!
//! Result order is first-discovery order: for a scan that is snapshot order,
//! for indexed evaluation the order leaves admit records during a
//! left-to-right walk. The order sequence is append-only and never resorted.
//!
//! Evaluation state lives for one [`search`] call and is owned by it; nothing
//! here needs locking or supports mid-flight cancellation.

use crate::ast::{CompareOp, Comparison, Expr, TagSet};
use crate::normalize::normalize;
use crate::parser::parse_or_fallback;
use crate::provider::{ProviderError, RecordProvider};
use crate::record::Record;
use log::debug;
use std::collections::{BTreeSet, HashMap};

/// How to evaluate a query against a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Load a full snapshot and filter it in memory.
    Scan,
    /// One provider lookup per leaf comparison.
    Indexed,
}

/// Does `record` satisfy `expr`?
///
/// Records without a `file` tag never match. A tag missing from the record is
/// simply non-matching, never an error. Handles non-normalized trees too:
/// open defaults read as `any`/`like`, and boolean tag-sets are checked
/// in place.
pub fn matches(expr: &Expr, record: &Record) -> bool {
    if record.file().is_none() {
        return false;
    }
    check(expr, record)
}

fn check(expr: &Expr, record: &Record) -> bool {
    match expr {
        Expr::And(children) => children.iter().all(|c| check(c, record)),
        Expr::Or(children) => children.iter().any(|c| check(c, record)),
        Expr::Compare(c) => check_comparison(c, record),
    }
}

fn check_comparison(c: &Comparison, record: &Record) -> bool {
    let tags = c.tags.as_ref().unwrap_or(&TagSet::Any);
    let op = c.op.unwrap_or(CompareOp::Like);
    tag_set_satisfied(tags, op, &c.value, record)
}

fn tag_set_satisfied(tags: &TagSet, op: CompareOp, value: &str, record: &Record) -> bool {
    match tags {
        TagSet::Any => record.tags().any(|(_, v)| op.matches(value, &v.coerce())),
        TagSet::Tag(name) => record
            .get(name)
            .map(|v| op.matches(value, &v.coerce()))
            .unwrap_or(false),
        TagSet::And(members) => members
            .iter()
            .all(|m| tag_set_satisfied(m, op, value, record)),
        TagSet::Or(members) => members
            .iter()
            .any(|m| tag_set_satisfied(m, op, value, record)),
    }
}

/// Filter a snapshot in place, keeping snapshot order.
pub fn scan(expr: &Expr, records: &[Record]) -> Vec<Record> {
    records
        .iter()
        .filter(|record| matches(expr, record))
        .cloned()
        .collect()
}

/// Per-call evaluation state for the indexed strategy: the records seen so
/// far keyed by file, plus the append-only first-seen order.
#[derive(Default)]
struct EvalState {
    state: HashMap<String, Record>,
    order: Vec<String>,
}

impl EvalState {
    /// Record a match, returning its file identifier. First sighting wins:
    /// the stored record and its position never change afterwards.
    fn admit(&mut self, record: Record) -> Option<String> {
        let file = record.file()?.to_string();
        if !self.state.contains_key(&file) {
            self.order.push(file.clone());
            self.state.insert(file.clone(), record);
        }
        Some(file)
    }
}

fn indexed<P: RecordProvider + ?Sized>(
    expr: &Expr,
    provider: &P,
) -> Result<Vec<Record>, ProviderError> {
    let mut st = EvalState::default();
    let fileset = walk(expr, provider, &mut st)?;
    Ok(st
        .order
        .iter()
        .filter(|file| fileset.contains(*file))
        .map(|file| st.state[file].clone())
        .collect())
}

fn walk<P: RecordProvider + ?Sized>(
    expr: &Expr,
    provider: &P,
    st: &mut EvalState,
) -> Result<BTreeSet<String>, ProviderError> {
    match expr {
        Expr::And(children) => {
            // All children are walked even once the intersection is empty so
            // that state and order stay deterministic across record sets.
            let mut sets = children.iter().map(|c| walk(c, provider, st));
            let mut acc = sets.next().transpose()?.unwrap_or_default();
            for set in sets {
                let set = set?;
                acc = acc.intersection(&set).cloned().collect();
            }
            Ok(acc)
        }
        Expr::Or(children) => {
            let mut acc = BTreeSet::new();
            for child in children {
                acc.extend(walk(child, provider, st)?);
            }
            Ok(acc)
        }
        Expr::Compare(c) => leaf(c, provider, st),
    }
}

/// One backend lookup for a single-tag comparison, post-filtered through the
/// in-memory predicate so both strategies agree on edge cases (notably `=i=`,
/// which has no native backend lookup and routes through substring search).
fn leaf<P: RecordProvider + ?Sized>(
    c: &Comparison,
    provider: &P,
    st: &mut EvalState,
) -> Result<BTreeSet<String>, ProviderError> {
    let tags = c.tags.clone().unwrap_or(TagSet::Any);
    let op = c.op.unwrap_or(CompareOp::Like);
    match tags {
        TagSet::Any | TagSet::Tag(_) => {
            let tag_name = match &tags {
                TagSet::Tag(name) => name.as_str(),
                _ => "any",
            };
            let candidates = match op {
                CompareOp::Exact => provider.find(tag_name, &c.value)?,
                CompareOp::ExactCi | CompareOp::Like => provider.search(tag_name, &c.value)?,
            };
            let clause = Expr::Compare(Comparison::new(tags.clone(), op, c.value.clone()));
            let mut fileset = BTreeSet::new();
            for record in candidates {
                if matches(&clause, &record) {
                    if let Some(file) = st.admit(record) {
                        fileset.insert(file);
                    }
                }
            }
            Ok(fileset)
        }
        // A non-normalized tree: distribute over the tag-set here, same as
        // unfolding would have.
        TagSet::And(members) => walk(
            &Expr::and(
                members
                    .into_iter()
                    .map(|m| Expr::Compare(Comparison::new(m, op, c.value.clone())))
                    .collect(),
            ),
            provider,
            st,
        ),
        TagSet::Or(members) => walk(
            &Expr::or(
                members
                    .into_iter()
                    .map(|m| Expr::Compare(Comparison::new(m, op, c.value.clone())))
                    .collect(),
            ),
            provider,
            st,
        ),
    }
}

/// Evaluate a normalized expression with the given strategy.
pub fn evaluate<P: RecordProvider + ?Sized>(
    expr: &Expr,
    provider: &P,
    strategy: Strategy,
) -> Result<Vec<Record>, ProviderError> {
    match strategy {
        Strategy::Scan => {
            let snapshot = provider.list_all()?;
            Ok(scan(expr, &snapshot))
        }
        Strategy::Indexed => indexed(expr, provider),
    }
}

/// End-to-end search: parse (with the `any like` fallback), normalize,
/// evaluate.
pub fn search<P: RecordProvider + ?Sized>(
    query: &str,
    provider: &P,
    strategy: Strategy,
) -> Result<Vec<Record>, ProviderError> {
    let expr = normalize(parse_or_fallback(query));
    debug!("normalized query: {expr}");
    evaluate(&expr, provider, strategy)
}
