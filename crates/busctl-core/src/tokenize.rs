//! Split busctl text into whitespace-separated tokens.
//!
//! busctl prints strings double-quoted, and those strings may contain spaces:
//! `a{ss} 1 "greeting" "hello world"`. [`tokenize`] keeps a quoted span
//! (quotes and escapes included) inside a single token; [`unquote`] turns such
//! a token back into the plain string.

/// Split `raw` on whitespace outside double quotes.
///
/// Quotes and backslash escapes are kept verbatim in the returned tokens.
/// An unterminated quote runs to the end of the input.
///
/// ```
/// use busctl_core::tokenize;
///
/// let tokens = tokenize(r#"su "hello world" 123"#);
/// assert_eq!(tokens, vec!["su", "\"hello world\"", "123"]);
/// ```
pub fn tokenize(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut started = false;
    let mut in_quotes = false;
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_quotes => {
                current.push(ch);
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                started = true;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                started = true;
                current.push(c);
            }
        }
    }
    if started {
        tokens.push(current);
    }

    tokens
}

/// Strip the surrounding double quotes of a token and resolve its escapes.
/// Tokens that are not quoted are returned unchanged.
pub fn unquote(token: &str) -> String {
    match token
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) => unescape_string(inner),
        None => token.to_string(),
    }
}

/// Resolve `\\`, `\"`, `\n`, `\r` and `\t`. Unknown escapes are kept as written.
fn unescape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
