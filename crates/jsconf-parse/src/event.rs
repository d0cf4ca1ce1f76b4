//! Event types for the configuration-file parser.

use std::borrow::Cow;

use crate::Span;

/// Events emitted by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'src> {
    // Document boundaries
    /// Start of document.
    DocumentStart,
    /// End of document.
    DocumentEnd {
        /// Byte length of the source.
        len: u32,
    },

    // Top-level bindings
    /// Start of a top-level binding such as `export default <value>`.
    BindingStart {
        /// Span of the binding keywords (`export default`, `module.exports =`).
        span: Span,
        /// What the value is bound to.
        target: BindingTarget<'src>,
    },
    /// End of a top-level binding.
    BindingEnd,

    // Objects
    /// Start of an object literal `{ ... }`.
    ObjectStart {
        /// Span of the opening brace.
        span: Span,
    },
    /// End of an object literal.
    ObjectEnd {
        /// Span of the closing brace, or an empty span at end of input.
        span: Span,
        /// Whether the closing brace was present.
        closed: bool,
    },

    // Arrays
    /// Start of an array literal `[ ... ]`.
    ArrayStart {
        /// Span of the opening bracket.
        span: Span,
    },
    /// End of an array literal.
    ArrayEnd {
        /// Span of the closing bracket, or an empty span at end of input.
        span: Span,
        /// Whether the closing bracket was present.
        closed: bool,
    },

    // Calls
    /// Start of a call expression whose arguments are parsed, e.g.
    /// `defineNuxtConfig(`.
    CallStart {
        /// Span of the callee.
        span: Span,
        /// Callee text, e.g. `defineNuxtConfig` or `config.merge`.
        callee: &'src str,
    },
    /// End of a call expression.
    CallEnd {
        /// Span of the closing paren, or an empty span at end of input.
        span: Span,
        /// Whether the closing paren was present.
        closed: bool,
    },

    // Entry structure (within objects)
    /// Start of an entry (property, method or spread).
    EntryStart {
        /// Span of the first token of the entry.
        span: Span,
    },
    /// The key of an entry.
    Key {
        /// Span of the key token(s), quotes and brackets included.
        span: Span,
        /// Key name after unquoting. `None` for computed keys.
        name: Option<Cow<'src, str>>,
        /// Syntax used for the key.
        kind: KeyKind,
    },
    /// A spread entry `...expr`; the spread value follows.
    Spread {
        /// Span of the `...` token.
        span: Span,
    },
    /// The `:` between a key and its value.
    Colon {
        /// Span of the colon.
        span: Span,
    },
    /// End of an entry.
    EntryEnd {
        /// Byte offset just after the last token of the entry.
        end: u32,
    },

    // Values
    /// A single-token value.
    Scalar {
        /// Span of the scalar.
        span: Span,
        /// Value after unquoting (strings) or the raw text (everything else).
        value: Cow<'src, str>,
        /// Kind of scalar.
        kind: ScalarKind,
    },
    /// An expression the parser does not model (functions, operators,
    /// member chains). Its tokens are skipped with bracket balancing.
    Expr {
        /// Span of the whole expression.
        span: Span,
    },
    /// A value was expected but absent, e.g. `{ key: }`.
    Missing {
        /// The gap where the value should be.
        span: Span,
    },

    // Errors
    /// Parse error.
    Error {
        /// Span where error occurred.
        span: Span,
        /// Kind of error.
        kind: ParseErrorKind,
    },
}

/// What a top-level binding binds its value to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingTarget<'src> {
    /// `export default <value>`
    ExportDefault,
    /// `module.exports = <value>`
    ModuleExports,
    /// `export = <value>` (TypeScript)
    ExportAssignment,
    /// `const name = <value>` (also `let`, `var`, `export const`)
    Variable(&'src str),
}

/// Syntax used for an object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Bare identifier: `build`
    Identifier,
    /// Quoted string: `"vue.config"` or `'http-equiv'`
    String,
    /// Numeric: `0`
    Number,
    /// Computed: `[expr]`
    Computed,
}

/// Kind of scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Quoted string `'...'` or `"..."`.
    String,
    /// Template literal `` `...` ``.
    Template,
    /// Numeric literal.
    Number,
    /// Regular expression literal.
    Regex,
    /// `true`, `false`, `null` or `undefined`.
    Literal,
    /// A lone identifier, e.g. a reference to a variable.
    Identifier,
}

/// Parse error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Unexpected token.
    UnexpectedToken,
    /// Token the tokenizer could not read (unterminated string, stray byte).
    InvalidToken,
    /// Unclosed object (missing `}`).
    UnclosedObject,
    /// Unclosed array (missing `]`).
    UnclosedArray,
    /// Unclosed call arguments (missing `)`).
    UnclosedCall,
    /// Expected a key.
    ExpectedKey,
    /// Expected a value.
    ExpectedValue,
    /// Two entries or elements without a comma between them.
    MissingComma,
}
