//! Token types for the configuration-file tokenizer.

use crate::Span;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structural tokens
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `.`
    Dot,
    /// `...`
    Ellipsis,
    /// `=`
    Eq,
    /// `=>`
    Arrow,
    /// `?` (including `?.` and `??`)
    Question,
    /// Any other operator: `+`, `===`, `&&`, `<`, `!`, ...
    Punct,

    // Atoms
    /// Identifier or keyword: `foo`, `$el`, `export`, `true`
    Ident,
    /// String literal: `'...'` or `"..."`
    String,
    /// Template literal: `` `...${expr}...` ``
    Template,
    /// Numeric literal: `42`, `0x1F`, `1_000`, `.5e3`
    Number,
    /// Regular expression literal: `/\.vue$/i`
    Regex,

    // Comment tokens
    /// Line comment: `// ...`
    LineComment,
    /// Block comment: `/* ... */`
    BlockComment,

    // Whitespace tokens
    /// Horizontal whitespace: spaces and tabs
    Whitespace,
    /// Newline: `\n` or `\r\n`
    Newline,

    // Special tokens
    /// End of file
    Eof,
    /// Lexer error (unrecognized or unterminated input)
    Error,
}

impl TokenKind {
    /// Whether this token is trivia (whitespace or comments).
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::Newline
                | TokenKind::LineComment
                | TokenKind::BlockComment
        )
    }

    /// Whether a `/` following this token starts a regular expression
    /// rather than a division.
    pub(crate) fn allows_regex_after(&self) -> bool {
        !matches!(
            self,
            TokenKind::RBrace
                | TokenKind::RBracket
                | TokenKind::RParen
                | TokenKind::Ident
                | TokenKind::String
                | TokenKind::Template
                | TokenKind::Number
                | TokenKind::Regex
        )
    }
}

/// A token with its kind, span, and source text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span in the source text.
    pub span: Span,
    /// The source text of this token.
    pub text: &'src str,
}

impl<'src> Token<'src> {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, text: &'src str) -> Self {
        Self { kind, span, text }
    }

    /// Whether this is the identifier `word`.
    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }
}
