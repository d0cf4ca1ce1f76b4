//! Tokenizer for JavaScript/TypeScript configuration files.

use crate::{Span, Token, TokenKind};
use tracing::trace;

/// A tokenizer that produces tokens from configuration source text.
#[derive(Clone)]
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Current byte position in `source`.
    pos: u32,
    /// Kind of the last non-trivia token, used to tell regexes from division.
    last_significant: Option<TokenKind>,
}

impl<'src> Tokenizer<'src> {
    /// Create a new tokenizer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: 0,
            last_significant: None,
        }
    }

    /// Get the current byte position.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Check if we're at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Peek at the next character without consuming it.
    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    /// Peek at the nth character (0-indexed) without consuming.
    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining.chars().nth(n)
    }

    /// Advance by one character and return it.
    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8() as u32;
        self.remaining = &self.remaining[c.len_utf8()..];
        Some(c)
    }

    /// Advance while `pred` holds.
    #[inline]
    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.advance();
        }
    }

    /// Check if the remaining text starts with the given prefix.
    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    /// Create a token from the given start position to current position.
    fn token(&mut self, kind: TokenKind, start: u32) -> Token<'src> {
        let span = Span::new(start, self.pos);
        let text = &self.source[start as usize..self.pos as usize];
        trace!("Token {:?} at {:?}: {:?}", kind, span, text);
        if !kind.is_trivia() {
            self.last_significant = Some(kind);
        }
        Token::new(kind, span, text)
    }

    /// Consume `n` single-byte characters and produce a token of `kind`.
    fn punct(&mut self, kind: TokenKind, n: usize) -> Token<'src> {
        let start = self.pos;
        for _ in 0..n {
            self.advance();
        }
        self.token(kind, start)
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return self.token(TokenKind::Eof, start);
        };

        match c {
            '{' => self.punct(TokenKind::LBrace, 1),
            '}' => self.punct(TokenKind::RBrace, 1),
            '[' => self.punct(TokenKind::LBracket, 1),
            ']' => self.punct(TokenKind::RBracket, 1),
            '(' => self.punct(TokenKind::LParen, 1),
            ')' => self.punct(TokenKind::RParen, 1),
            ',' => self.punct(TokenKind::Comma, 1),
            ':' => self.punct(TokenKind::Colon, 1),
            ';' => self.punct(TokenKind::Semicolon, 1),

            '.' if self.starts_with("...") => self.punct(TokenKind::Ellipsis, 3),
            '.' if matches!(self.peek_nth(1), Some(d) if d.is_ascii_digit()) => {
                self.tokenize_number()
            }
            '.' => self.punct(TokenKind::Dot, 1),

            '=' if self.starts_with("=>") => self.punct(TokenKind::Arrow, 2),
            '=' if self.starts_with("===") => self.punct(TokenKind::Punct, 3),
            '=' if self.starts_with("==") => self.punct(TokenKind::Punct, 2),
            '=' => self.punct(TokenKind::Eq, 1),

            '?' if self.starts_with("??=") => self.punct(TokenKind::Punct, 3),
            '?' if self.starts_with("??") || self.starts_with("?.") => {
                self.punct(TokenKind::Question, 2)
            }
            '?' => self.punct(TokenKind::Question, 1),

            '\'' | '"' => self.tokenize_string(c),
            '`' => self.tokenize_template(),

            '/' if self.starts_with("//") => self.tokenize_line_comment(),
            '/' if self.starts_with("/*") => self.tokenize_block_comment(),
            '/' if self
                .last_significant
                .is_none_or(|kind| kind.allows_regex_after()) =>
            {
                self.tokenize_regex()
            }
            '/' if self.starts_with("/=") => self.punct(TokenKind::Punct, 2),
            '/' => self.punct(TokenKind::Punct, 1),

            ' ' | '\t' | '\u{feff}' => {
                self.advance_while(|c| matches!(c, ' ' | '\t' | '\u{feff}'));
                self.token(TokenKind::Whitespace, start)
            }
            '\n' => self.punct(TokenKind::Newline, 1),
            '\r' if self.peek_nth(1) == Some('\n') => self.punct(TokenKind::Newline, 2),
            '\r' => {
                self.advance();
                self.token(TokenKind::Whitespace, start)
            }

            _ if c.is_ascii_digit() => self.tokenize_number(),
            _ if is_ident_start(c) => {
                self.advance_while(is_ident_continue);
                self.token(TokenKind::Ident, start)
            }
            _ if is_operator_char(c) => {
                self.advance_while(is_operator_char);
                self.token(TokenKind::Punct, start)
            }
            _ if c.is_whitespace() => {
                self.advance();
                self.token(TokenKind::Whitespace, start)
            }

            // Error: unrecognized character
            _ => {
                self.advance();
                self.token(TokenKind::Error, start)
            }
        }
    }

    /// Tokenize a numeric literal. Accepts decimal, hex, octal, binary,
    /// separators, exponents and the BigInt suffix.
    fn tokenize_number(&mut self) -> Token<'src> {
        let start = self.pos;
        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        // Exponent sign: `1e-3`
        while matches!(self.peek(), Some('+' | '-'))
            && self.source[start as usize..self.pos as usize].ends_with(['e', 'E'])
            && !self.source[start as usize..self.pos as usize].starts_with("0x")
        {
            self.advance();
            self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        }
        self.token(TokenKind::Number, start)
    }

    /// Tokenize a quoted string literal.
    fn tokenize_string(&mut self, quote: char) -> Token<'src> {
        let start = self.pos;
        self.advance(); // opening quote

        loop {
            match self.peek() {
                None | Some('\n') => {
                    // Unterminated string
                    return self.token(TokenKind::Error, start);
                }
                Some('\\') => {
                    self.advance();
                    if self.peek().is_some() {
                        self.advance();
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    return self.token(TokenKind::String, start);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Tokenize a template literal, including any `${...}` substitutions.
    fn tokenize_template(&mut self) -> Token<'src> {
        let start = self.pos;
        if self.skip_template() {
            self.token(TokenKind::Template, start)
        } else {
            self.token(TokenKind::Error, start)
        }
    }

    /// Skip a template literal starting at the opening backtick. Returns
    /// `false` if the input ends first.
    fn skip_template(&mut self) -> bool {
        self.advance(); // opening backtick
        loop {
            match self.peek() {
                None => return false,
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some('`') => {
                    self.advance();
                    return true;
                }
                Some('$') if self.peek_nth(1) == Some('{') => {
                    self.advance();
                    self.advance();
                    if !self.skip_substitution() {
                        return false;
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Skip the body of a `${...}` substitution up to and including its
    /// closing brace.
    fn skip_substitution(&mut self) -> bool {
        let mut depth = 1usize;
        loop {
            match self.peek() {
                None => return false,
                Some('{') => {
                    depth += 1;
                    self.advance();
                }
                Some('}') => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                Some(q @ ('\'' | '"')) => {
                    if self.tokenize_string(q).kind == TokenKind::Error {
                        return false;
                    }
                }
                Some('`') => {
                    if !self.skip_template() {
                        return false;
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Tokenize a line comment: `// ...`.
    fn tokenize_line_comment(&mut self) -> Token<'src> {
        let start = self.pos;
        self.advance_while(|c| c != '\n' && c != '\r');
        self.token(TokenKind::LineComment, start)
    }

    /// Tokenize a block comment: `/* ... */`.
    fn tokenize_block_comment(&mut self) -> Token<'src> {
        let start = self.pos;
        self.advance();
        self.advance();
        while !self.is_eof() {
            if self.starts_with("*/") {
                self.advance();
                self.advance();
                return self.token(TokenKind::BlockComment, start);
            }
            self.advance();
        }
        // Unterminated comment
        self.token(TokenKind::Error, start)
    }

    /// Tokenize a regular expression literal: `/body/flags`.
    fn tokenize_regex(&mut self) -> Token<'src> {
        let start = self.pos;
        self.advance(); // opening slash
        let mut in_class = false;
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return self.token(TokenKind::Error, start);
                }
                Some('\\') => {
                    self.advance();
                    if self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some('[') => {
                    in_class = true;
                    self.advance();
                }
                Some(']') => {
                    in_class = false;
                    self.advance();
                }
                Some('/') if !in_class => {
                    self.advance();
                    self.advance_while(is_ident_continue);
                    return self.token(TokenKind::Regex, start);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

/// Check if a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

/// Check if a character can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

/// Characters that combine into operator tokens.
fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '%' | '<' | '>' | '!' | '&' | '|' | '^' | '~' | '@' | '#'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> Vec<(TokenKind, &str)> {
        Tokenizer::new(source).map(|t| (t.kind, t.text)).collect()
    }

    fn significant(source: &str) -> Vec<(TokenKind, &str)> {
        Tokenizer::new(source)
            .filter(|t| !t.kind.is_trivia())
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_structural_tokens() {
        assert_eq!(
            tokenize("{}[](),:;."),
            vec![
                (TokenKind::LBrace, "{"),
                (TokenKind::RBrace, "}"),
                (TokenKind::LBracket, "["),
                (TokenKind::RBracket, "]"),
                (TokenKind::LParen, "("),
                (TokenKind::RParen, ")"),
                (TokenKind::Comma, ","),
                (TokenKind::Colon, ":"),
                (TokenKind::Semicolon, ";"),
                (TokenKind::Dot, "."),
            ]
        );
        assert_eq!(tokenize("..."), vec![(TokenKind::Ellipsis, "...")]);
        assert_eq!(tokenize("=>"), vec![(TokenKind::Arrow, "=>")]);
        assert_eq!(tokenize("="), vec![(TokenKind::Eq, "=")]);
        assert_eq!(tokenize("==="), vec![(TokenKind::Punct, "===")]);
    }

    #[test]
    fn test_export_default() {
        assert_eq!(
            tokenize("export default {}"),
            vec![
                (TokenKind::Ident, "export"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Ident, "default"),
                (TokenKind::Whitespace, " "),
                (TokenKind::LBrace, "{"),
                (TokenKind::RBrace, "}"),
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            tokenize(r#""http-equiv""#),
            vec![(TokenKind::String, r#""http-equiv""#)]
        );
        assert_eq!(
            tokenize(r"'it\'s'"),
            vec![(TokenKind::String, r"'it\'s'")]
        );
        assert_eq!(tokenize("'open"), vec![(TokenKind::Error, "'open")]);
    }

    #[test]
    fn test_template_with_substitutions() {
        assert_eq!(
            tokenize("`a ${ {x: `b${1}`}.x } c`"),
            vec![(TokenKind::Template, "`a ${ {x: `b${1}`}.x } c`")]
        );
        assert_eq!(tokenize("`open ${"), vec![(TokenKind::Error, "`open ${")]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            significant("1 0x1F 1_000 .5 1e-3 10n"),
            vec![
                (TokenKind::Number, "1"),
                (TokenKind::Number, "0x1F"),
                (TokenKind::Number, "1_000"),
                (TokenKind::Number, ".5"),
                (TokenKind::Number, "1e-3"),
                (TokenKind::Number, "10n"),
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            tokenize("// comment"),
            vec![(TokenKind::LineComment, "// comment")]
        );
        assert_eq!(
            tokenize("/* a\nb */"),
            vec![(TokenKind::BlockComment, "/* a\nb */")]
        );
        assert_eq!(tokenize("/* open"), vec![(TokenKind::Error, "/* open")]);
    }

    #[test]
    fn test_regex_vs_division() {
        assert_eq!(
            significant(r"test: /\.vue$/i,"),
            vec![
                (TokenKind::Ident, "test"),
                (TokenKind::Colon, ":"),
                (TokenKind::Regex, r"/\.vue$/i"),
                (TokenKind::Comma, ","),
            ]
        );
        assert_eq!(
            significant("a / 2"),
            vec![
                (TokenKind::Ident, "a"),
                (TokenKind::Punct, "/"),
                (TokenKind::Number, "2"),
            ]
        );
        assert_eq!(
            significant(r"x = /[/]/"),
            vec![
                (TokenKind::Ident, "x"),
                (TokenKind::Eq, "="),
                (TokenKind::Regex, "/[/]/"),
            ]
        );
    }

    #[test]
    fn test_whitespace() {
        assert_eq!(tokenize("  \t"), vec![(TokenKind::Whitespace, "  \t")]);
        assert_eq!(tokenize("\n"), vec![(TokenKind::Newline, "\n")]);
        assert_eq!(tokenize("\r\n"), vec![(TokenKind::Newline, "\r\n")]);
    }

    #[test]
    fn test_spans_cover_input() {
        let source = "module.exports = { head: { meta: [{ charset: 'utf-8' }] } }";
        let mut expected_start = 0;
        for token in Tokenizer::new(source) {
            assert_eq!(token.span.start, expected_start);
            assert_eq!(token.span.slice(source), token.text);
            expected_start = token.span.end;
        }
        assert_eq!(expected_start as usize, source.len());
    }

    #[test]
    fn test_unicode_identifier() {
        assert_eq!(tokenize("héllo"), vec![(TokenKind::Ident, "héllo")]);
    }
}
