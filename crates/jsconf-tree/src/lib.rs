//! Document tree representation for JavaScript/TypeScript configuration
//! files.
//!
//! This crate turns parser events into a tree of [`Value`]s with spans and
//! finds the configuration object a file exports.

mod builder;
mod diagnostic;
mod value;

pub use builder::TreeBuilder;
pub use diagnostic::ParseError;
pub use jsconf_parse::{KeyKind, ParseErrorKind, ScalarKind, Span};
pub use value::{Array, Binding, BindingKind, Call, Entry, Key, Object, Scalar, Value};

/// How many variable references [`Document::config_root`] follows before
/// giving up.
const MAX_REFERENCE_DEPTH: usize = 8;

/// A parsed configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Top-level bindings in source order.
    pub bindings: Vec<Binding>,
    /// Parse errors, in the order they were found.
    pub errors: Vec<ParseError>,
    /// Byte length of the source.
    pub len: u32,
}

impl Document {
    /// Parse a configuration file. Never fails; problems end up in
    /// [`Document::errors`].
    pub fn parse(source: &str) -> Self {
        let mut builder = TreeBuilder::new();
        jsconf_parse::Parser::new(source).parse(&mut builder);
        builder.finish()
    }

    /// The binding the module exports, if any.
    pub fn export(&self) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.kind.is_export())
    }

    /// The last top-level variable named `name`.
    pub fn variable(&self, name: &str) -> Option<&Binding> {
        self.bindings
            .iter()
            .rev()
            .find(|b| matches!(&b.kind, BindingKind::Variable(n) if n == name))
    }

    /// The configuration object of this file.
    ///
    /// Starts from the exported value. A call such as
    /// `defineNuxtConfig({ ... })` is unwrapped to its first argument that
    /// resolves to an object, and an identifier is followed to the top-level
    /// variable it names.
    pub fn config_root(&self) -> Option<&Object> {
        self.resolve_object(&self.export()?.value, 0)
    }

    fn resolve_object<'a>(&'a self, value: &'a Value, depth: usize) -> Option<&'a Object> {
        if depth > MAX_REFERENCE_DEPTH {
            return None;
        }
        match value {
            Value::Object(object) => Some(object),
            Value::Call(call) => call
                .args
                .iter()
                .find_map(|arg| self.resolve_object(arg, depth + 1)),
            Value::Scalar(scalar) if scalar.kind == ScalarKind::Identifier => {
                let binding = self.variable(&scalar.text)?;
                self.resolve_object(&binding.value, depth + 1)
            }
            _ => None,
        }
    }

    /// Whether the source parsed without errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
