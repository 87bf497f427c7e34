//! # Query Grammar
//!
//! Tokenizer and recursive-descent parser for the tag query language.
//!
//! Grammar (standard boolean precedence, `or` looser than `and`):
//!
//! ```text
//! query      = orExpr ;
//! orExpr     = andExpr (OR andExpr)* ;
//! andExpr    = atom (AND atom)* ;
//! atom       = '(' query ')' | '[' query ']' | '{' query '}' | comparison ;
//! comparison = [ tagSet comparator ] literal ;
//! tagSet     = tagAnd (OR tagAnd)* ;
//! tagAnd     = tagRef (AND tagRef)* ;
//! tagRef     = '<' NAME '>' | '%' NAME '%' ;
//! comparator = '==' | '=i=' | /like/i ;
//! literal    = QUOTED_STRING | BARE_WORD ;
//! AND        = '&&' | '&' | /and/i ;
//! OR         = '||' | '|' | /or/i ;
//! ```
//!
//! `(...)`, `[...]`, `{...}` are interchangeable grouping delimiters; a closing
//! delimiter must match its opener. `<name>` and `%name%` are equivalent tag
//! spellings and the special name `any` is the "every tag" sentinel. Quoted
//! strings preserve whitespace and accept `\"` and `\\` escapes.
//!
//! Parsing is all-or-nothing: if the full input cannot be consumed as one
//! well-formed expression, [`parse`] fails and [`parse_or_fallback`] degrades
//! to the legacy behavior of treating the whole string as an implicit
//! `any like <string>` comparison.

use crate::ast::{CompareOp, Comparison, Expr, TagSet};
use log::debug;
use thiserror::Error;

/// Failure to consume the input as a single well-formed query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected character `{0}` at byte {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated tag reference starting at byte {0}")]
    UnterminatedTag(usize),
    #[error("empty tag reference at byte {0}")]
    EmptyTag(usize),
    #[error("unexpected end of query")]
    UnexpectedEof,
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("expected `{expected}` to close group, found `{found}`")]
    MismatchedDelimiter { expected: char, found: String },
    #[error("trailing input after query: `{0}`")]
    TrailingInput(String),
}

/// Grouping delimiter kind. Purely cosmetic, but open/close must pair up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Paren,
    Bracket,
    Brace,
}

impl Group {
    fn closing(self) -> char {
        match self {
            Group::Paren => ')',
            Group::Bracket => ']',
            Group::Brace => '}',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// `<name>` or `%name%`, name lowercased.
    Tag(String),
    /// Bare word literal.
    Word(String),
    /// Quoted string literal.
    Str(String),
    And,
    Or,
    Like,
    Exact,
    ExactCi,
    Open(Group),
    Close(Group),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Tag(name) => format!("<{name}>"),
            Token::Word(w) => w.clone(),
            Token::Str(s) => format!("\"{s}\""),
            Token::And => "and".into(),
            Token::Or => "or".into(),
            Token::Like => "like".into(),
            Token::Exact => "==".into(),
            Token::ExactCi => "=i=".into(),
            Token::Open(g) => match g {
                Group::Paren => "(".into(),
                Group::Bracket => "[".into(),
                Group::Brace => "{".into(),
            },
            Token::Close(g) => g.closing().to_string(),
        }
    }
}

/// Characters that terminate a bare word.
fn is_word_break(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>' | '%' | '&' | '|' | '"' | '=')
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, ch) = chars[i];
        match ch {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::Open(Group::Paren));
                i += 1;
            }
            '[' => {
                tokens.push(Token::Open(Group::Bracket));
                i += 1;
            }
            '{' => {
                tokens.push(Token::Open(Group::Brace));
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close(Group::Paren));
                i += 1;
            }
            ']' => {
                tokens.push(Token::Close(Group::Bracket));
                i += 1;
            }
            '}' => {
                tokens.push(Token::Close(Group::Brace));
                i += 1;
            }
            '&' => {
                i += 1;
                if i < chars.len() && chars[i].1 == '&' {
                    i += 1;
                }
                tokens.push(Token::And);
            }
            '|' => {
                i += 1;
                if i < chars.len() && chars[i].1 == '|' {
                    i += 1;
                }
                tokens.push(Token::Or);
            }
            '<' => {
                let (name, next) = read_tag_name(&chars, i + 1, '>', pos)?;
                tokens.push(Token::Tag(name));
                i = next;
            }
            '%' => {
                let (name, next) = read_tag_name(&chars, i + 1, '%', pos)?;
                tokens.push(Token::Tag(name));
                i = next;
            }
            '"' => {
                let mut value = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(ParseError::UnterminatedString),
                        Some(&(_, '"')) => {
                            i += 1;
                            break;
                        }
                        Some(&(_, '\\')) => {
                            // Only `\"` and `\\` are escapes; anything else
                            // keeps the backslash literally.
                            match chars.get(i + 1) {
                                Some(&(_, c @ ('"' | '\\'))) => {
                                    value.push(c);
                                    i += 2;
                                }
                                _ => {
                                    value.push('\\');
                                    i += 1;
                                }
                            }
                        }
                        Some(&(_, c)) => {
                            value.push(c);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(value));
            }
            '=' => {
                match (chars.get(i + 1).map(|c| c.1), chars.get(i + 2).map(|c| c.1)) {
                    (Some('='), _) => {
                        tokens.push(Token::Exact);
                        i += 2;
                    }
                    (Some('i'), Some('=')) => {
                        tokens.push(Token::ExactCi);
                        i += 3;
                    }
                    _ => return Err(ParseError::UnexpectedChar('=', pos)),
                }
            }
            '>' => return Err(ParseError::UnexpectedChar('>', pos)),
            _ => {
                let mut word = String::new();
                while i < chars.len() && !is_word_break(chars[i].1) {
                    word.push(chars[i].1);
                    i += 1;
                }
                tokens.push(keyword_or_word(word));
            }
        }
    }

    Ok(tokens)
}

/// Read a tag name up to `close`, lowercasing it. Names are ASCII letters.
fn read_tag_name(
    chars: &[(usize, char)],
    mut i: usize,
    close: char,
    start: usize,
) -> Result<(String, usize), ParseError> {
    let mut name = String::new();
    loop {
        match chars.get(i) {
            None => return Err(ParseError::UnterminatedTag(start)),
            Some(&(_, c)) if c == close => {
                if name.is_empty() {
                    return Err(ParseError::EmptyTag(start));
                }
                return Ok((name, i + 1));
            }
            Some(&(_, c)) if c.is_ascii_alphabetic() => {
                name.push(c.to_ascii_lowercase());
                i += 1;
            }
            Some(&(pos, c)) => return Err(ParseError::UnexpectedChar(c, pos)),
        }
    }
}

fn keyword_or_word(word: String) -> Token {
    if word.eq_ignore_ascii_case("and") {
        Token::And
    } else if word.eq_ignore_ascii_case("or") {
        Token::Or
    } else if word.eq_ignore_ascii_case("like") {
        Token::Like
    } else {
        Token::Word(word)
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek2(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    fn next(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_query(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_or()?;
        match self.peek() {
            None => Ok(expr),
            Some(tok) => Err(ParseError::TrailingInput(tok.describe())),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut children = vec![self.parse_and()?];
        while matches!(self.peek(), Some(Token::Or)) {
            self.pos += 1;
            children.push(self.parse_and()?);
        }
        Ok(Expr::or(children))
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut children = vec![self.parse_atom()?];
        while matches!(self.peek(), Some(Token::And)) {
            self.pos += 1;
            children.push(self.parse_atom()?);
        }
        Ok(Expr::and(children))
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        if let Some(&Token::Open(group)) = self.peek() {
            self.pos += 1;
            let expr = self.parse_or()?;
            match self.next() {
                Some(&Token::Close(found)) if found == group => Ok(expr),
                Some(tok) => Err(ParseError::MismatchedDelimiter {
                    expected: group.closing(),
                    found: tok.describe(),
                }),
                None => Err(ParseError::UnexpectedEof),
            }
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Some(Token::Tag(_))) {
            let tags = self.parse_tag_or()?;
            let op = match self.next() {
                Some(Token::Exact) => CompareOp::Exact,
                Some(Token::ExactCi) => CompareOp::ExactCi,
                Some(Token::Like) => CompareOp::Like,
                Some(tok) => return Err(ParseError::UnexpectedToken(tok.describe())),
                None => return Err(ParseError::UnexpectedEof),
            };
            let value = self.parse_literal()?;
            Ok(Expr::Compare(Comparison::new(tags, op, value)))
        } else {
            let value = self.parse_literal()?;
            Ok(Expr::Compare(Comparison::bare(value)))
        }
    }

    /// `tagAnd (OR tagAnd)*` — the trailing lookahead keeps an `or` that joins
    /// two comparisons from being swallowed into the tag-set.
    fn parse_tag_or(&mut self) -> Result<TagSet, ParseError> {
        let mut members = vec![self.parse_tag_and()?];
        while matches!(self.peek(), Some(Token::Or)) && matches!(self.peek2(), Some(Token::Tag(_)))
        {
            self.pos += 1;
            members.push(self.parse_tag_and()?);
        }
        Ok(TagSet::or(members))
    }

    fn parse_tag_and(&mut self) -> Result<TagSet, ParseError> {
        let mut members = vec![self.parse_tag_ref()?];
        while matches!(self.peek(), Some(Token::And)) && matches!(self.peek2(), Some(Token::Tag(_)))
        {
            self.pos += 1;
            members.push(self.parse_tag_ref()?);
        }
        Ok(TagSet::and(members))
    }

    fn parse_tag_ref(&mut self) -> Result<TagSet, ParseError> {
        match self.next() {
            Some(Token::Tag(name)) if name == "any" => Ok(TagSet::Any),
            Some(Token::Tag(name)) => Ok(TagSet::Tag(name.clone())),
            Some(tok) => Err(ParseError::UnexpectedToken(tok.describe())),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn parse_literal(&mut self) -> Result<String, ParseError> {
        match self.next() {
            Some(Token::Word(w)) => Ok(w.clone()),
            Some(Token::Str(s)) => Ok(s.clone()),
            Some(tok) => Err(ParseError::UnexpectedToken(tok.describe())),
            None => Err(ParseError::UnexpectedEof),
        }
    }
}

/// Parse `text` into a query expression.
///
/// The entire input must be consumed; a partial parse is an error, never a
/// truncated tree.
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(ParseError::UnexpectedEof);
    }
    Parser { tokens, pos: 0 }.parse_query()
}

/// Parse `text`, falling back to an implicit `any like <text>` comparison when
/// the grammar rejects it.
///
/// This is the legacy compatibility behavior for plain-word searches from the
/// days before the query language existed: any string is a valid query. The
/// fallback is deterministic and silent (logged at debug level only).
pub fn parse_or_fallback(text: &str) -> Expr {
    match parse(text) {
        Ok(expr) => expr,
        Err(err) => {
            debug!("query `{text}` did not parse ({err}); falling back to substring search");
            Expr::Compare(Comparison::bare(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> TagSet {
        TagSet::Tag(name.into())
    }

    fn cmp(tags: TagSet, op: CompareOp, value: &str) -> Expr {
        Expr::Compare(Comparison::new(tags, op, value))
    }

    #[test]
    fn bare_word_is_defaulted_comparison() {
        assert_eq!(
            parse("foobar").unwrap(),
            Expr::Compare(Comparison::bare("foobar"))
        );
    }

    #[test]
    fn quoted_string_preserves_whitespace() {
        assert_eq!(
            parse(r#""Kind of Blue""#).unwrap(),
            Expr::Compare(Comparison::bare("Kind of Blue"))
        );
    }

    #[test]
    fn quoted_string_escapes() {
        assert_eq!(
            parse(r#""a \"b\" \\ c""#).unwrap(),
            Expr::Compare(Comparison::bare(r#"a "b" \ c"#))
        );
    }

    #[test]
    fn tagged_exact_comparison() {
        assert_eq!(
            parse("<artist>==foobar").unwrap(),
            cmp(tag("artist"), CompareOp::Exact, "foobar")
        );
    }

    #[test]
    fn percent_tag_spelling_is_equivalent() {
        assert_eq!(
            parse("%artist% == foobar").unwrap(),
            parse("<artist> == foobar").unwrap()
        );
    }

    #[test]
    fn tag_names_are_case_insensitive() {
        assert_eq!(
            parse("<Artist> == x").unwrap(),
            parse("<artist> == x").unwrap()
        );
    }

    #[test]
    fn any_tag_is_sentinel() {
        assert_eq!(
            parse("<any> like foo").unwrap(),
            cmp(TagSet::Any, CompareOp::Like, "foo")
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            parse("<artist> LIKE x AND <album> Like y").unwrap(),
            Expr::And(vec![
                cmp(tag("artist"), CompareOp::Like, "x"),
                cmp(tag("album"), CompareOp::Like, "y"),
            ])
        );
    }

    #[test]
    fn or_binds_looser_than_and() {
        // a and b or c == (a and b) or c
        let parsed = parse("a and b or c").unwrap();
        assert_eq!(
            parsed,
            Expr::Or(vec![
                Expr::And(vec![
                    Expr::Compare(Comparison::bare("a")),
                    Expr::Compare(Comparison::bare("b")),
                ]),
                Expr::Compare(Comparison::bare("c")),
            ])
        );
    }

    #[test]
    fn symbol_operators_match_words() {
        assert_eq!(parse("a && b").unwrap(), parse("a and b").unwrap());
        assert_eq!(parse("a & b").unwrap(), parse("a AND b").unwrap());
        assert_eq!(parse("a || b").unwrap(), parse("a or b").unwrap());
        assert_eq!(parse("a | b").unwrap(), parse("a OR b").unwrap());
    }

    #[test]
    fn grouping_delimiters_are_interchangeable() {
        let reference = parse("(a or b) and c").unwrap();
        assert_eq!(parse("[a or b] and c").unwrap(), reference);
        assert_eq!(parse("{a or b} and c").unwrap(), reference);
    }

    #[test]
    fn mismatched_grouping_fails() {
        assert!(parse("(a or b] and c").is_err());
        assert!(parse("(a or b").is_err());
    }

    #[test]
    fn tag_set_or_parses_into_tag_set() {
        assert_eq!(
            parse("<artist>|<album>==foobar").unwrap(),
            cmp(
                TagSet::Or(vec![tag("artist"), tag("album")]),
                CompareOp::Exact,
                "foobar"
            )
        );
    }

    #[test]
    fn tag_set_and_binds_tighter_than_or() {
        // <a>|<b>&<c> == Or(a, And(b, c))
        assert_eq!(
            parse("<a>|<b>&<c> like x").unwrap(),
            cmp(
                TagSet::Or(vec![tag("a"), TagSet::And(vec![tag("b"), tag("c")])]),
                CompareOp::Like,
                "x"
            )
        );
    }

    #[test]
    fn or_after_tag_set_joins_comparisons() {
        // The or here belongs to the expression level because no tag follows.
        assert_eq!(
            parse("<artist> == x or blue").unwrap(),
            Expr::Or(vec![
                cmp(tag("artist"), CompareOp::Exact, "x"),
                Expr::Compare(Comparison::bare("blue")),
            ])
        );
    }

    #[test]
    fn whitespace_is_insignificant() {
        assert_eq!(
            parse("<artist>==foobar").unwrap(),
            parse("  <artist>  ==  foobar  ").unwrap()
        );
    }

    #[test]
    fn partial_input_fails() {
        assert!(parse("<artist> == x garbage ==").is_err());
        assert!(parse("<artist>").is_err());
        assert!(parse("<artist> and x").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn fallback_wraps_whole_string() {
        let expr = parse_or_fallback("miles ((davis");
        assert_eq!(expr, Expr::Compare(Comparison::bare("miles ((davis")));
    }

    #[test]
    fn fallback_not_used_for_valid_query() {
        assert_eq!(
            parse_or_fallback("<artist> == x"),
            parse("<artist> == x").unwrap()
        );
    }

    #[test]
    fn unterminated_tag_fails() {
        assert!(matches!(parse("<artist"), Err(ParseError::UnterminatedTag(_))));
        assert!(matches!(parse("<> == x"), Err(ParseError::EmptyTag(_))));
    }

    #[test]
    fn unterminated_string_fails() {
        assert!(matches!(
            parse(r#""no end"#),
            Err(ParseError::UnterminatedString)
        ));
    }
}
