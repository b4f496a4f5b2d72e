//! Lightweight removal of C-style comments.
use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Line comments, block comments and both kinds of quoted literal.
///
/// Literals are matched as whole units so that comment delimiters inside them
/// are never seen by the comment alternatives. `\\.` consumes an escaped
/// character, so an escaped quote does not close its literal.
static COMMENT_OR_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?sm)//.*?$|/\*.*?\*/|'(?:\\.|[^\\'])*'|"(?:\\.|[^\\"])*""#)
        .expect("comment pattern is valid")
});

/// Replaces every `//` and `/* */` comment in `text` with a single space.
///
/// String literals are returned verbatim. The space keeps the tokens on either
/// side of a comment apart. Line comments stop before the newline, so line
/// structure is preserved for line-oriented matchers.
pub fn strip_comments(text: &str) -> Cow<'_, str> {
    COMMENT_OR_LITERAL.replace_all(text, |caps: &Captures<'_>| {
        let matched = &caps[0];
        if matched.starts_with('/') {
            " ".to_string()
        } else {
            matched.to_string()
        }
    })
}
