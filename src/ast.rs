//! # Query AST Node Model
//!
//! Typed, immutable nodes for the tag query language. The parser builds these
//! bottom-up in a single pass; normalization and evaluation consume them
//! top-down and never mutate a tree in place.
//!
//! The node set is closed: a query is either a leaf [`Comparison`] or an n-ary
//! `and`/`or` combinator over sub-queries. A combinator with exactly one child
//! is the identity, so the [`Expr::and`] and [`Expr::or`] constructors collapse
//! it to the child and no unary wrapper ever reaches evaluation.

use std::fmt;

/// Comparison operator between a tag value and a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==` — byte-exact string equality.
    Exact,
    /// `=i=` — case-insensitive exact equality.
    ExactCi,
    /// `like` — case-insensitive substring containment. The default when the
    /// surface syntax omits the comparator.
    Like,
}

impl CompareOp {
    /// Apply the operator to one scalar tag value.
    ///
    /// `value` is the literal from the query, `candidate` the (coerced) tag
    /// value from a record.
    pub fn matches(self, value: &str, candidate: &str) -> bool {
        match self {
            CompareOp::Exact => candidate == value,
            CompareOp::ExactCi => candidate.to_lowercase() == value.to_lowercase(),
            CompareOp::Like => candidate.to_lowercase().contains(&value.to_lowercase()),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Exact => write!(f, "=="),
            CompareOp::ExactCi => write!(f, "=i="),
            CompareOp::Like => write!(f, "like"),
        }
    }
}

/// The left side of a comparison: a boolean combination of tag names, or the
/// `any` sentinel meaning "every tag present on the record".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSet {
    /// Matches against every tag the record carries.
    Any,
    /// A single named tag. Names are stored lowercase.
    Tag(String),
    /// All member tag-sets must satisfy the comparison.
    And(Vec<TagSet>),
    /// At least one member tag-set must satisfy the comparison.
    Or(Vec<TagSet>),
}

impl TagSet {
    /// Build an `and` combination, collapsing a single member to itself.
    pub fn and(mut members: Vec<TagSet>) -> TagSet {
        if members.len() == 1 {
            members.pop().unwrap()
        } else {
            TagSet::And(members)
        }
    }

    /// Build an `or` combination, collapsing a single member to itself.
    pub fn or(mut members: Vec<TagSet>) -> TagSet {
        if members.len() == 1 {
            members.pop().unwrap()
        } else {
            TagSet::Or(members)
        }
    }

    /// True for a tag-set that needs no unfolding (a bare tag or `any`).
    pub fn is_single(&self) -> bool {
        matches!(self, TagSet::Any | TagSet::Tag(_))
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagSet::Any => write!(f, "<any>"),
            TagSet::Tag(name) => write!(f, "<{name}>"),
            TagSet::And(members) => {
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, "&")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
            TagSet::Or(members) => {
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
        }
    }
}

/// Leaf query clause: one operator applied to one literal over one tag-set.
///
/// `tags` and `op` are `None` when the surface syntax omitted them (a bare
/// literal is a search over all tags). The defaults — `any` and `like` — are
/// resolved once by [`crate::normalize::normalize`], not by the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub tags: Option<TagSet>,
    pub op: Option<CompareOp>,
    pub value: String,
}

impl Comparison {
    /// Comparison as written with an explicit tag-set and operator.
    pub fn new(tags: TagSet, op: CompareOp, value: impl Into<String>) -> Comparison {
        Comparison {
            tags: Some(tags),
            op: Some(op),
            value: value.into(),
        }
    }

    /// Bare-literal comparison with both defaults left open.
    pub fn bare(value: impl Into<String>) -> Comparison {
        Comparison {
            tags: None,
            op: None,
            value: value.into(),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (None, None) = (&self.tags, &self.op) {
            return write!(f, "{}", quote(&self.value));
        }
        let tags = self.tags.as_ref().unwrap_or(&TagSet::Any);
        let op = self.op.unwrap_or(CompareOp::Like);
        write!(f, "{tags} {op} {}", quote(&self.value))
    }
}

/// Query expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Compare(Comparison),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    /// Build an `and` node, collapsing a single child to itself.
    pub fn and(mut children: Vec<Expr>) -> Expr {
        if children.len() == 1 {
            children.pop().unwrap()
        } else {
            Expr::And(children)
        }
    }

    /// Build an `or` node, collapsing a single child to itself.
    pub fn or(mut children: Vec<Expr>) -> Expr {
        if children.len() == 1 {
            children.pop().unwrap()
        } else {
            Expr::Or(children)
        }
    }
}

impl fmt::Display for Expr {
    /// Prints the canonical surface form, which re-parses to an equivalent
    /// tree: literals quoted, `<tag>` spelling, word operators, nested
    /// combinators parenthesized.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn child(f: &mut fmt::Formatter<'_>, e: &Expr) -> fmt::Result {
            match e {
                Expr::Compare(_) => write!(f, "{e}"),
                _ => write!(f, "({e})"),
            }
        }
        match self {
            Expr::Compare(c) => write!(f, "{c}"),
            Expr::And(children) => {
                for (i, c) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " and ")?;
                    }
                    child(f, c)?;
                }
                Ok(())
            }
            Expr::Or(children) => {
                for (i, c) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " or ")?;
                    }
                    child(f, c)?;
                }
                Ok(())
            }
        }
    }
}

/// Quote a literal for canonical printing, escaping `\` and `"`.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_child_and_collapses() {
        let c = Expr::Compare(Comparison::bare("x"));
        assert_eq!(Expr::and(vec![c.clone()]), c);
        assert_eq!(Expr::or(vec![c.clone()]), c);
    }

    #[test]
    fn two_children_stay_wrapped() {
        let a = Expr::Compare(Comparison::bare("a"));
        let b = Expr::Compare(Comparison::bare("b"));
        assert_eq!(
            Expr::and(vec![a.clone(), b.clone()]),
            Expr::And(vec![a, b])
        );
    }

    #[test]
    fn single_member_tag_set_collapses() {
        let t = TagSet::Tag("artist".into());
        assert_eq!(TagSet::or(vec![t.clone()]), t);
        assert_eq!(TagSet::and(vec![t.clone()]), t);
    }

    #[test]
    fn compare_op_semantics() {
        assert!(CompareOp::Exact.matches("Foo", "Foo"));
        assert!(!CompareOp::Exact.matches("foo", "Foo"));
        assert!(CompareOp::ExactCi.matches("foo", "Foo"));
        assert!(!CompareOp::ExactCi.matches("fo", "Foo"));
        assert!(CompareOp::Like.matches("oo", "Foobar"));
        assert!(!CompareOp::Like.matches("baz", "Foobar"));
    }

    #[test]
    fn display_quotes_literals() {
        let c = Comparison::new(TagSet::Tag("artist".into()), CompareOp::Exact, "Miles Davis");
        assert_eq!(c.to_string(), r#"<artist> == "Miles Davis""#);

        let bare = Comparison::bare(r#"say "hi""#);
        assert_eq!(bare.to_string(), r#""say \"hi\"""#);
    }

    #[test]
    fn display_parenthesizes_nested_combinators() {
        let e = Expr::Or(vec![
            Expr::And(vec![
                Expr::Compare(Comparison::bare("a")),
                Expr::Compare(Comparison::bare("b")),
            ]),
            Expr::Compare(Comparison::bare("c")),
        ]);
        assert_eq!(e.to_string(), r#"("a" and "b") or "c""#);
    }

    #[test]
    fn display_tag_set_or() {
        let c = Comparison::new(
            TagSet::Or(vec![TagSet::Tag("artist".into()), TagSet::Tag("album".into())]),
            CompareOp::Like,
            "blue",
        );
        assert_eq!(c.to_string(), r#"<artist>|<album> like "blue""#);
    }
}
