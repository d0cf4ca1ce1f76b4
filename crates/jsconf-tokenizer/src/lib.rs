//! A tokenizer for the configuration-file subset of JavaScript and TypeScript.
//!
//! The tokenizer is lossless: every byte of the input belongs to exactly one
//! token, trivia included. It never fails; malformed input produces
//! [`TokenKind::Error`] tokens and scanning continues.

mod span;
pub use span::Span;

mod token;
pub use token::{Token, TokenKind};

mod tokenizer;
pub use tokenizer::Tokenizer;
