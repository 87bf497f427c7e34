//! # Normalization ("unfolding")
//!
//! Rewrites a parsed query so that every leaf comparison carries exactly one
//! tag (or the `any` sentinel), which is all a backend lookup can answer.
//!
//! Two things happen in one pass, producing a new tree:
//!
//! 1. Defaults left open by the grammar are resolved: a missing comparator
//!    becomes `like`, a missing tag-set becomes `any`.
//! 2. A comparison over a boolean tag-set is distributed: the tag combination
//!    moves outward as the same boolean combinator over single-tag
//!    comparisons, e.g. `<artist>|<album> == X` unfolds to
//!    `<artist> == X or <album> == X`.
//!
//! Single-child combinators collapse on the way out, so no unary `and`/`or`
//! wrapper survives, and the whole pass is idempotent.

use crate::ast::{CompareOp, Comparison, Expr, TagSet};

/// Normalize a query expression for evaluation.
pub fn normalize(expr: Expr) -> Expr {
    match expr {
        Expr::And(children) => Expr::and(children.into_iter().map(normalize).collect()),
        Expr::Or(children) => Expr::or(children.into_iter().map(normalize).collect()),
        Expr::Compare(c) => unfold(c),
    }
}

/// Resolve the grammar's open defaults, then distribute a multi-tag
/// comparison over its boolean combinator. A comparison already on a bare
/// single tag (or `any`) is returned as-is.
fn unfold(c: Comparison) -> Expr {
    let op = c.op.unwrap_or(CompareOp::Like);
    match c.tags.unwrap_or(TagSet::Any) {
        tags @ (TagSet::Any | TagSet::Tag(_)) => {
            Expr::Compare(Comparison::new(tags, op, c.value))
        }
        TagSet::And(members) => Expr::and(
            members
                .into_iter()
                .map(|m| unfold(Comparison::new(m, op, c.value.clone())))
                .collect(),
        ),
        TagSet::Or(members) => Expr::or(
            members
                .into_iter()
                .map(|m| unfold(Comparison::new(m, op, c.value.clone())))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn tag_cmp(name: &str, op: CompareOp, value: &str) -> Expr {
        Expr::Compare(Comparison::new(TagSet::Tag(name.into()), op, value))
    }

    #[test]
    fn bare_literal_gets_defaults() {
        let n = normalize(Expr::Compare(Comparison::bare("foo")));
        assert_eq!(
            n,
            Expr::Compare(Comparison::new(TagSet::Any, CompareOp::Like, "foo"))
        );
    }

    #[test]
    fn defaults_match_explicit_spelling() {
        assert_eq!(
            normalize(parse("foo").unwrap()),
            normalize(parse("<any> like foo").unwrap())
        );
    }

    #[test]
    fn or_tag_set_unfolds_to_or_of_comparisons() {
        let n = normalize(parse("<artist>|<album> == X").unwrap());
        assert_eq!(
            n,
            Expr::Or(vec![
                tag_cmp("artist", CompareOp::Exact, "X"),
                tag_cmp("album", CompareOp::Exact, "X"),
            ])
        );
    }

    #[test]
    fn and_tag_set_unfolds_to_and_of_comparisons() {
        let n = normalize(parse("<artist>&<album> like X").unwrap());
        assert_eq!(
            n,
            Expr::And(vec![
                tag_cmp("artist", CompareOp::Like, "X"),
                tag_cmp("album", CompareOp::Like, "X"),
            ])
        );
    }

    #[test]
    fn nested_tag_set_unfolds_recursively() {
        let n = normalize(parse("<a>|<b>&<c> like x").unwrap());
        assert_eq!(
            n,
            Expr::Or(vec![
                tag_cmp("a", CompareOp::Like, "x"),
                Expr::And(vec![
                    tag_cmp("b", CompareOp::Like, "x"),
                    tag_cmp("c", CompareOp::Like, "x"),
                ]),
            ])
        );
    }

    #[test]
    fn single_tag_comparison_is_untouched() {
        let parsed = parse("<artist> == x").unwrap();
        assert_eq!(normalize(parsed.clone()), parsed);
    }

    #[test]
    fn idempotent() {
        for query in [
            "foo",
            "<artist> == x",
            "<artist>|<album> like blue",
            "(a and b) or <x>&<y> =i= z",
        ] {
            let once = normalize(parse(query).unwrap());
            assert_eq!(normalize(once.clone()), once, "query: {query}");
        }
    }

    #[test]
    fn no_single_child_combinators_survive() {
        fn assert_no_unary(e: &Expr) {
            match e {
                Expr::Compare(_) => {}
                Expr::And(cs) | Expr::Or(cs) => {
                    assert!(cs.len() >= 2);
                    cs.iter().for_each(assert_no_unary);
                }
            }
        }
        for query in ["((foo))", "[{a}] and (b or c)", "<a>|<b> == x"] {
            assert_no_unary(&normalize(parse(query).unwrap()));
        }
    }
}
