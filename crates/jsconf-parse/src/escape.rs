//! String literal unquoting.

use std::borrow::Cow;

/// Strip the quotes from a string literal and process escape sequences.
///
/// Borrows when the literal has no escapes. Unknown escapes yield the escaped
/// character itself, the way JavaScript treats them outside strict templates.
pub fn unquote(literal: &str) -> Cow<'_, str> {
    let inner = match literal.chars().next() {
        Some(q @ ('\'' | '"' | '`')) => {
            let body = &literal[1..];
            body.strip_suffix(q).unwrap_or(body)
        }
        _ => literal,
    };

    if !inner.contains('\\') {
        return Cow::Borrowed(inner);
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let code = if chars.peek() == Some(&'{') {
                    chars.next();
                    let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                    u32::from_str_radix(&hex, 16).ok()
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    u32::from_str_radix(&hex, 16).ok()
                };
                out.push(code.and_then(char::from_u32).unwrap_or('\u{fffd}'));
            }
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                let code = u32::from_str_radix(&hex, 16).ok();
                out.push(code.and_then(char::from_u32).unwrap_or('\u{fffd}'));
            }
            // Line continuation
            Some('\n') => {}
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrows_without_escapes() {
        assert!(matches!(unquote("'http-equiv'"), Cow::Borrowed("http-equiv")));
        assert!(matches!(unquote("\"vue.config\""), Cow::Borrowed("vue.config")));
    }

    #[test]
    fn processes_escapes() {
        assert_eq!(unquote(r#""a\"b""#), "a\"b");
        assert_eq!(unquote(r"'it\'s'"), "it's");
        assert_eq!(unquote(r"'A\u{42}\x43'"), "ABC");
        assert_eq!(unquote(r"'\q'"), "q");
    }

    #[test]
    fn tolerates_missing_closing_quote() {
        assert_eq!(unquote("'open"), "open");
    }
}
