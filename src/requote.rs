//! Reconstructing a query string from shell-split arguments.
//!
//! `mpdgrep (%title% like "Q u o t e d")` reaches us as
//! `["(%title%", "like", "Q u o t e d)"]`: the shell consumed the quotes, and
//! any argument still containing whitespace must originally have been quoted.
//! [`requote`] puts the quotes back, peeling grouping punctuation off the
//! fragment first so the delimiters end up outside the quotes where the
//! grammar expects them.
//!
//! Known limitation: this is a heuristic. A literal that itself contains
//! grouping punctuation next to whitespace (say a song titled `"wait)"`)
//! gets its punctuation re-attached outside the quotes and may be misquoted.
//! Full recovery is impossible once the shell has eaten the quoting; the
//! result is potentially-wrong search results, not an error.

/// Rebuild a single query string from a shell-split argument vector.
pub fn requote<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter()
        .map(|arg| requote_arg(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn requote_arg(arg: &str) -> String {
    if !arg.contains(char::is_whitespace) {
        return arg.to_string();
    }

    let open = arg.len() - arg.trim_start_matches(['(', '[', '{']).len();
    let trimmed = &arg[open..];
    let close = trimmed.len() - trimmed.trim_end_matches([')', ']', '}']).len();
    let core = &trimmed[..trimmed.len() - close];

    let mut out = String::with_capacity(arg.len() + 2);
    out.push_str(&arg[..open]);
    out.push('"');
    out.push_str(core);
    out.push('"');
    out.push_str(&trimmed[trimmed.len() - close..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_words_pass_through() {
        assert_eq!(requote(&["<artist>", "like", "blue"]), "<artist> like blue");
    }

    #[test]
    fn whitespace_argument_regains_quotes() {
        assert_eq!(
            requote(&["(%title%", "like", "Q u o t e d)"]),
            r#"(%title% like "Q u o t e d")"#
        );
    }

    #[test]
    fn nested_grouping_is_peeled_in_order() {
        assert_eq!(requote(&["[{a b"]), r#"[{"a b""#);
        assert_eq!(requote(&["a b}]"]), r#""a b"}]"#);
        assert_eq!(requote(&["([a b c])"]), r#"(["a b c"])"#);
    }

    #[test]
    fn requoted_output_parses() {
        use crate::parser::parse;
        let text = requote(&["(%title%", "like", "Q u o t e d)"]);
        assert!(parse(&text).is_ok());
    }

    #[test]
    fn empty_argv_is_empty_query() {
        assert_eq!(requote::<&str>(&[]), "");
    }
}
