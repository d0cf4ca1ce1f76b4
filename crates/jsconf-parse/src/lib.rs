//! Event-based parser for JavaScript/TypeScript configuration files.
//!
//! Only the part of the language that configuration files are made of is
//! modelled: top-level bindings (`export default`, `module.exports =`,
//! `const x =`), object and array literals, wrapper calls and simple
//! scalars. Everything else is skipped as an opaque expression.

pub use jsconf_tokenizer::{Span, Token, TokenKind, Tokenizer};

mod event;
pub use event::{BindingTarget, Event, KeyKind, ParseErrorKind, ScalarKind};

mod escape;
pub use escape::unquote;

mod parser;
pub use parser::{ParseCallback, Parser};
