//! Recursive-descent event parser for configuration files.

use std::borrow::Cow;

use jsconf_tokenizer::{Span, Token, TokenKind, Tokenizer};
use tracing::trace;

use crate::escape::unquote;
use crate::event::{BindingTarget, Event, KeyKind, ParseErrorKind, ScalarKind};

#[cfg(test)]
mod tests;

/// Receives parser events in document order.
pub trait ParseCallback<'src> {
    /// Handle one event. Return `false` to stop receiving events.
    fn event(&mut self, event: Event<'src>) -> bool;
}

impl<'src> ParseCallback<'src> for Vec<Event<'src>> {
    fn event(&mut self, event: Event<'src>) -> bool {
        self.push(event);
        true
    }
}

/// Error-tolerant parser for configuration files.
///
/// The parser never fails: malformed input is reported through
/// [`Event::Error`] and parsing resumes at the next separator.
#[derive(Clone)]
pub struct Parser<'src> {
    input: &'src str,
    tokenizer: Tokenizer<'src>,
    /// Current significant (non-trivia) token.
    current: Token<'src>,
    /// Whether a line break separates `current` from the previous token.
    newline_before: bool,
    /// End offset of the previous significant token.
    prev_end: u32,
    events: Vec<Event<'src>>,
}

impl<'src> Parser<'src> {
    /// Create a new parser for the given source.
    pub fn new(source: &'src str) -> Self {
        let mut parser = Self {
            input: source,
            tokenizer: Tokenizer::new(source),
            current: Token::new(TokenKind::Eof, Span::empty(0), ""),
            newline_before: false,
            prev_end: 0,
            events: vec![Event::DocumentStart],
        };
        parser.bump();
        parser.prev_end = 0;
        parser
    }

    /// Parse the whole document into a vector of events.
    pub fn parse_to_vec(mut self) -> Vec<Event<'src>> {
        self.parse_document();
        self.events
    }

    /// Parse the whole document, feeding events to `callback` until it asks
    /// to stop.
    pub fn parse(self, callback: &mut impl ParseCallback<'src>) {
        for event in self.parse_to_vec() {
            if !callback.event(event) {
                break;
            }
        }
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn kind(&self) -> TokenKind {
        self.current.kind
    }

    fn emit(&mut self, event: Event<'src>) {
        trace!(?event, "emit");
        self.events.push(event);
    }

    fn error(&mut self, span: Span, kind: ParseErrorKind) {
        self.emit(Event::Error { span, kind });
    }

    /// Move to the next significant token, remembering whether a line break
    /// was skipped on the way.
    fn bump(&mut self) {
        if self.current.kind != TokenKind::Eof {
            self.prev_end = self.current.span.end;
        }
        self.newline_before = false;
        loop {
            let token = self.tokenizer.next_token();
            match token.kind {
                TokenKind::Newline => self.newline_before = true,
                TokenKind::BlockComment if token.text.contains('\n') => {
                    self.newline_before = true
                }
                kind if kind.is_trivia() => {}
                TokenKind::Error => {
                    self.error(token.span, ParseErrorKind::InvalidToken);
                    self.current = token;
                    return;
                }
                _ => {
                    self.current = token;
                    return;
                }
            }
        }
    }

    /// The `n`th significant token after the current one.
    fn lookahead(&self, n: usize) -> Token<'src> {
        let mut tokenizer = self.tokenizer.clone();
        let mut seen = 0;
        loop {
            let token = tokenizer.next_token();
            if token.kind.is_trivia() {
                continue;
            }
            if token.kind == TokenKind::Eof || seen == n {
                return token;
            }
            seen += 1;
        }
    }

    fn eof_span(&self) -> Span {
        Span::empty(self.input.len() as u32)
    }

    /// Skip a bracketed group starting at the current opener, nested groups
    /// included.
    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen => depth += 1,
                TokenKind::RBrace | TokenKind::RBracket | TokenKind::RParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => {}
            }
            self.bump();
        }
    }

    /// Skip tokens until one of `stop` (or end of input) is current.
    fn recover(&mut self, stop: &[TokenKind]) {
        while !stop.contains(&self.kind()) && self.kind() != TokenKind::Eof {
            if matches!(
                self.kind(),
                TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen
            ) {
                self.skip_balanced();
            } else {
                self.bump();
            }
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_document(&mut self) {
        loop {
            match self.kind() {
                TokenKind::Eof => break,
                TokenKind::Ident => self.parse_statement(),
                TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen => {
                    self.skip_balanced()
                }
                _ => self.bump(),
            }
        }
        let len = self.input.len() as u32;
        self.emit(Event::DocumentEnd { len });
    }

    /// Recognize a binding at the current identifier, or step over it.
    fn parse_statement(&mut self) {
        let start = self.current.span;

        if self.current.is_ident("export") {
            self.bump();
            if self.current.is_ident("default") {
                let span = start.cover(self.current.span);
                self.bump();
                self.parse_binding(span, BindingTarget::ExportDefault);
            } else if self.kind() == TokenKind::Eq {
                let span = start.cover(self.current.span);
                self.bump();
                self.parse_binding(span, BindingTarget::ExportAssignment);
            } else if is_declaration_keyword(&self.current) {
                self.parse_declaration(start);
            }
            return;
        }

        if self.current.is_ident("module")
            && self.lookahead(0).kind == TokenKind::Dot
            && self.lookahead(1).is_ident("exports")
            && self.lookahead(2).kind == TokenKind::Eq
        {
            for _ in 0..3 {
                self.bump();
            }
            let span = start.cover(self.current.span);
            self.bump();
            self.parse_binding(span, BindingTarget::ModuleExports);
            return;
        }

        if is_declaration_keyword(&self.current) {
            self.parse_declaration(start);
            return;
        }

        self.bump();
    }

    /// `const name [: Type] = value`, with the keyword current.
    fn parse_declaration(&mut self, start: Span) {
        self.bump();
        if self.kind() != TokenKind::Ident {
            // Destructuring patterns bind nothing we can complete in.
            return;
        }
        let name = self.current.text;
        self.bump();

        if self.kind() == TokenKind::Colon {
            loop {
                match self.kind() {
                    TokenKind::Eq | TokenKind::Semicolon | TokenKind::Eof => break,
                    TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen => {
                        self.skip_balanced()
                    }
                    _ => self.bump(),
                }
            }
        }

        if self.kind() != TokenKind::Eq {
            return;
        }
        let span = start.cover(self.current.span);
        self.bump();
        self.parse_binding(span, BindingTarget::Variable(name));
    }

    fn parse_binding(&mut self, span: Span, target: BindingTarget<'src>) {
        self.emit(Event::BindingStart { span, target });
        self.parse_value();
        self.emit(Event::BindingEnd);
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    fn parse_value(&mut self) {
        let start = self.current.span;
        let mark = self.events.len();

        let is_literal = match self.kind() {
            TokenKind::LBrace => {
                self.parse_object();
                true
            }
            TokenKind::LBracket => {
                self.parse_array();
                true
            }
            TokenKind::String => {
                let value = unquote(self.current.text);
                self.scalar(value, ScalarKind::String);
                false
            }
            TokenKind::Template => {
                self.scalar(Cow::Borrowed(self.current.text), ScalarKind::Template);
                false
            }
            TokenKind::Number => {
                self.scalar(Cow::Borrowed(self.current.text), ScalarKind::Number);
                false
            }
            TokenKind::Regex => {
                self.scalar(Cow::Borrowed(self.current.text), ScalarKind::Regex);
                false
            }
            TokenKind::Ident => match self.current.text {
                "true" | "false" | "null" | "undefined" => {
                    self.scalar(Cow::Borrowed(self.current.text), ScalarKind::Literal);
                    false
                }
                "function" | "class" | "new" | "async" | "await" | "typeof" | "void"
                | "delete" | "import" => {
                    self.parse_opaque(start);
                    return;
                }
                _ => {
                    self.parse_reference_or_call();
                    false
                }
            },
            TokenKind::RBrace
            | TokenKind::RBracket
            | TokenKind::RParen
            | TokenKind::Comma
            | TokenKind::Semicolon
            | TokenKind::Eof => {
                let gap = Span::new(self.prev_end.min(start.start), start.start);
                self.error(Span::empty(start.start), ParseErrorKind::ExpectedValue);
                self.emit(Event::Missing { span: gap });
                return;
            }
            _ => {
                self.parse_opaque(start);
                return;
            }
        };

        if self.continues_expression() {
            if is_literal {
                // `{ ... } as Config`, `[ ... ].filter(Boolean)`: keep the literal.
                self.skip_expression_tail();
            } else {
                self.events.truncate(mark);
                self.skip_expression_tail();
                let span = Span::new(start.start, self.prev_end);
                self.emit(Event::Expr { span });
            }
        }
    }

    fn scalar(&mut self, value: Cow<'src, str>, kind: ScalarKind) {
        let span = self.current.span;
        self.emit(Event::Scalar { span, value, kind });
        self.bump();
    }

    /// An identifier, a dotted member chain, or a call through either.
    fn parse_reference_or_call(&mut self) {
        let first = self.current.span;
        self.bump();
        let mut dotted = false;
        while self.kind() == TokenKind::Dot && self.lookahead(0).kind == TokenKind::Ident {
            self.bump();
            self.bump();
            dotted = true;
        }
        let callee_span = Span::new(first.start, self.prev_end);

        if self.kind() == TokenKind::LParen && !self.newline_before {
            let callee = callee_span.slice(self.input);
            self.parse_call(callee_span, callee);
        } else if dotted {
            self.emit(Event::Expr { span: callee_span });
        } else {
            let value = Cow::Borrowed(callee_span.slice(self.input));
            self.emit(Event::Scalar {
                span: callee_span,
                value,
                kind: ScalarKind::Identifier,
            });
        }
    }

    /// Skip an expression the parser does not model.
    fn parse_opaque(&mut self, start: Span) {
        if matches!(
            self.kind(),
            TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen
        ) {
            self.skip_balanced();
        } else {
            self.bump();
        }
        self.skip_expression_tail();
        let span = Span::new(start.start, self.prev_end);
        self.emit(Event::Expr { span });
    }

    /// Whether the current token continues the expression before it.
    fn continues_expression(&self) -> bool {
        match self.kind() {
            TokenKind::Comma
            | TokenKind::RBrace
            | TokenKind::RBracket
            | TokenKind::RParen
            | TokenKind::Semicolon
            | TokenKind::Colon
            | TokenKind::Eof => false,
            TokenKind::Dot
            | TokenKind::Question
            | TokenKind::Punct
            | TokenKind::Arrow
            | TokenKind::Eq
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Template => true,
            _ => !self.newline_before,
        }
    }

    /// Skip the rest of an expression up to a separator at depth zero.
    fn skip_expression_tail(&mut self) {
        let mut pending_ternaries = 0usize;
        let mut after_operator = true;
        loop {
            match self.kind() {
                TokenKind::Comma
                | TokenKind::RBrace
                | TokenKind::RBracket
                | TokenKind::RParen
                | TokenKind::Semicolon
                | TokenKind::Eof => return,
                TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen => {
                    self.skip_balanced();
                    after_operator = false;
                    continue;
                }
                TokenKind::Colon if pending_ternaries == 0 => return,
                TokenKind::Colon => pending_ternaries -= 1,
                TokenKind::Question if self.current.text == "?" => pending_ternaries += 1,
                TokenKind::Ident
                | TokenKind::String
                | TokenKind::Number
                | TokenKind::Regex
                | TokenKind::Template
                    if self.newline_before && !after_operator =>
                {
                    return;
                }
                _ => {}
            }
            after_operator = matches!(
                self.kind(),
                TokenKind::Punct
                    | TokenKind::Question
                    | TokenKind::Eq
                    | TokenKind::Arrow
                    | TokenKind::Dot
                    | TokenKind::Colon
            );
            self.bump();
        }
    }

    // ------------------------------------------------------------------
    // Literals
    // ------------------------------------------------------------------

    fn parse_object(&mut self) {
        let open = self.current.span;
        self.emit(Event::ObjectStart { span: open });
        self.bump();

        loop {
            match self.kind() {
                TokenKind::RBrace => {
                    let span = self.current.span;
                    self.emit(Event::ObjectEnd { span, closed: true });
                    self.bump();
                    return;
                }
                TokenKind::Eof => {
                    self.error(open, ParseErrorKind::UnclosedObject);
                    let span = self.eof_span();
                    self.emit(Event::ObjectEnd {
                        span,
                        closed: false,
                    });
                    return;
                }
                TokenKind::Comma => {
                    self.bump();
                    continue;
                }
                _ => self.parse_entry(),
            }

            match self.kind() {
                TokenKind::Comma => self.bump(),
                TokenKind::RBrace | TokenKind::Eof => {}
                kind if can_start_entry(kind) => {
                    self.error(Span::empty(self.prev_end), ParseErrorKind::MissingComma);
                }
                _ => {
                    self.error(self.current.span, ParseErrorKind::UnexpectedToken);
                    self.recover(&[TokenKind::Comma, TokenKind::RBrace]);
                }
            }
        }
    }

    fn parse_entry(&mut self) {
        let start = self.current.span;
        self.emit(Event::EntryStart { span: start });

        if self.kind() == TokenKind::Ellipsis {
            self.emit(Event::Spread { span: start });
            self.bump();
            self.parse_value();
            self.emit(Event::EntryEnd { end: self.prev_end });
            return;
        }

        // Accessor and method modifiers: `get x()`, `async x()`, `*x()`.
        if self.kind() == TokenKind::Ident
            && matches!(self.current.text, "get" | "set" | "async" | "static")
            && is_key_start(&self.lookahead(0))
        {
            self.bump();
        }
        if self.kind() == TokenKind::Punct && self.current.text == "*" {
            self.bump();
        }

        let key_span = self.current.span;
        match self.kind() {
            TokenKind::Ident => {
                let name = Cow::Borrowed(self.current.text);
                self.key(key_span, Some(name), KeyKind::Identifier);
                self.bump();
            }
            TokenKind::String => {
                let name = unquote(self.current.text);
                self.key(key_span, Some(name), KeyKind::String);
                self.bump();
            }
            TokenKind::Number => {
                let name = Cow::Borrowed(self.current.text);
                self.key(key_span, Some(name), KeyKind::Number);
                self.bump();
            }
            TokenKind::LBracket => {
                self.skip_balanced();
                let span = Span::new(key_span.start, self.prev_end);
                self.key(span, None, KeyKind::Computed);
            }
            _ => {
                self.error(key_span, ParseErrorKind::ExpectedKey);
                self.recover(&[TokenKind::Comma, TokenKind::RBrace]);
                self.emit(Event::EntryEnd { end: self.prev_end });
                return;
            }
        }

        match self.kind() {
            TokenKind::Colon => {
                let span = self.current.span;
                self.emit(Event::Colon { span });
                self.bump();
                self.parse_value();
            }
            TokenKind::LParen => self.parse_method_body(),
            TokenKind::Eq => {
                // Shorthand with initializer, only valid in patterns.
                self.bump();
                self.skip_expression_tail();
            }
            _ => {
                // Shorthand property: `{ build }`
            }
        }

        self.emit(Event::EntryEnd { end: self.prev_end });
    }

    fn key(&mut self, span: Span, name: Option<Cow<'src, str>>, kind: KeyKind) {
        self.emit(Event::Key { span, name, kind });
    }

    /// `(params) [: Type] { body }` after a method key; recorded as an opaque
    /// value.
    fn parse_method_body(&mut self) {
        let start = self.current.span.start;
        self.skip_balanced();
        if self.kind() == TokenKind::Colon {
            while !matches!(
                self.kind(),
                TokenKind::LBrace | TokenKind::Comma | TokenKind::RBrace | TokenKind::Eof
            ) {
                if matches!(self.kind(), TokenKind::LBracket | TokenKind::LParen) {
                    self.skip_balanced();
                } else {
                    self.bump();
                }
            }
        }
        if self.kind() == TokenKind::LBrace {
            self.skip_balanced();
        }
        let span = Span::new(start, self.prev_end);
        self.emit(Event::Expr { span });
    }

    fn parse_array(&mut self) {
        let open = self.current.span;
        self.emit(Event::ArrayStart { span: open });
        self.bump();

        loop {
            match self.kind() {
                TokenKind::RBracket => {
                    let span = self.current.span;
                    self.emit(Event::ArrayEnd { span, closed: true });
                    self.bump();
                    return;
                }
                TokenKind::Eof => {
                    self.error(open, ParseErrorKind::UnclosedArray);
                    let span = self.eof_span();
                    self.emit(Event::ArrayEnd {
                        span,
                        closed: false,
                    });
                    return;
                }
                TokenKind::Comma => {
                    self.bump();
                    continue;
                }
                TokenKind::Ellipsis => {
                    self.bump();
                    self.parse_value();
                }
                _ => self.parse_value(),
            }

            self.after_element(TokenKind::RBracket);
        }
    }

    fn parse_call(&mut self, callee_span: Span, callee: &'src str) {
        self.emit(Event::CallStart {
            span: callee_span,
            callee,
        });
        let open = self.current.span;
        self.bump();

        loop {
            match self.kind() {
                TokenKind::RParen => {
                    let span = self.current.span;
                    self.emit(Event::CallEnd { span, closed: true });
                    self.bump();
                    return;
                }
                TokenKind::Eof => {
                    self.error(open, ParseErrorKind::UnclosedCall);
                    let span = self.eof_span();
                    self.emit(Event::CallEnd {
                        span,
                        closed: false,
                    });
                    return;
                }
                TokenKind::Comma => {
                    self.bump();
                    continue;
                }
                TokenKind::Ellipsis => {
                    self.bump();
                    self.parse_value();
                }
                _ => self.parse_value(),
            }

            self.after_element(TokenKind::RParen);
        }
    }

    /// Handle what follows an array element or call argument.
    fn after_element(&mut self, close: TokenKind) {
        match self.kind() {
            TokenKind::Comma => self.bump(),
            TokenKind::Eof => {}
            kind if kind == close => {}
            TokenKind::LBrace | TokenKind::LBracket | TokenKind::String | TokenKind::Number => {
                self.error(Span::empty(self.prev_end), ParseErrorKind::MissingComma);
            }
            _ => {
                self.error(self.current.span, ParseErrorKind::UnexpectedToken);
                self.recover(&[TokenKind::Comma, close]);
            }
        }
    }
}

fn is_declaration_keyword(token: &Token<'_>) -> bool {
    token.is_ident("const") || token.is_ident("let") || token.is_ident("var")
}

/// Tokens that may begin an object entry.
fn can_start_entry(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident
            | TokenKind::String
            | TokenKind::Number
            | TokenKind::LBracket
            | TokenKind::Ellipsis
    )
}

/// Whether `token` can follow a `get`/`set`/`async` modifier as a key.
fn is_key_start(token: &Token<'_>) -> bool {
    matches!(
        token.kind,
        TokenKind::Ident | TokenKind::String | TokenKind::Number | TokenKind::LBracket
    ) || (token.kind == TokenKind::Punct && token.text == "*")
}
