//! Value types for configuration documents.
//!
//! Only the shapes that matter for configuration files are modelled
//! structurally: object and array literals, calls whose arguments are
//! literals, and scalars. Anything else is an opaque [`Value::Expr`] that
//! keeps its span so cursor lookups still know where it is.

use std::fmt;

use jsconf_parse::{KeyKind, ScalarKind, Span};

/// A value in a configuration document.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Object literal `{ ... }`.
    Object(Object),
    /// Array literal `[ ... ]`.
    Array(Array),
    /// Call expression with parsed arguments, e.g. `defineNuxtConfig({ ... })`.
    Call(Call),
    /// String, number, keyword literal or identifier.
    Scalar(Scalar),
    /// Expression that is not modelled.
    Expr(Span),
    /// A value that should be here but is not, e.g. after `key:`.
    Missing(Span),
}

impl Value {
    /// Source span of the value.
    pub fn span(&self) -> Span {
        match self {
            Value::Object(o) => o.span,
            Value::Array(a) => a.span,
            Value::Call(c) => c.span,
            Value::Scalar(s) => s.span,
            Value::Expr(span) | Value::Missing(span) => *span,
        }
    }

    /// The object literal, if this is one.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The array literal, if this is one.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The scalar text, if this is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(&s.text),
            _ => None,
        }
    }

    /// Whether this is an object or array literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    /// Get a nested value by a dotted path such as `head.meta[0].name`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(self);
        }
        let (segment, rest) = split_path(path);
        let next = if let Some(index) = segment.strip_prefix('[') {
            let index: usize = index.strip_suffix(']')?.parse().ok()?;
            self.as_array()?.items.get(index)?
        } else {
            self.as_object()?.get(segment)?
        };
        next.get(rest)
    }
}

fn split_path(path: &str) -> (&str, &str) {
    if path.starts_with('[')
        && let Some(end) = path.find(']')
    {
        let rest = &path[end + 1..];
        return (&path[..=end], rest.strip_prefix('.').unwrap_or(rest));
    }

    match (path.find('.'), path.find('[')) {
        (Some(d), Some(b)) if b < d => (&path[..b], &path[b..]),
        (Some(d), _) => (&path[..d], &path[d + 1..]),
        (None, Some(b)) => (&path[..b], &path[b..]),
        (None, None) => (path, ""),
    }
}

/// An object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Entries in source order.
    pub entries: Vec<Entry>,
    /// From the opening brace to the closing brace (or end of input).
    pub span: Span,
    /// Whether the closing brace was present.
    pub closed: bool,
}

impl Object {
    /// Value of the last entry named `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.name() == Some(name))
            .and_then(|e| e.value.as_ref())
    }

    /// Names of all named entries, in source order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(Entry::name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the object has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An array literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    /// Elements in source order.
    pub items: Vec<Value>,
    /// From the opening bracket to the closing bracket (or end of input).
    pub span: Span,
    /// Whether the closing bracket was present.
    pub closed: bool,
}

/// A call expression whose arguments were parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Callee text, e.g. `defineNuxtConfig`.
    pub callee: String,
    /// Arguments in source order.
    pub args: Vec<Value>,
    /// From the callee to the closing paren (or end of input).
    pub span: Span,
    /// Whether the closing paren was present.
    pub closed: bool,
}

/// A scalar value.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    /// Unquoted text for strings, raw text otherwise.
    pub text: String,
    /// What kind of scalar syntax was used.
    pub kind: ScalarKind,
    /// Source span.
    pub span: Span,
}

/// An entry in an object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The key. `None` for spread entries (`...base`).
    pub key: Option<Key>,
    /// Span of the `:` separator, if present.
    pub colon: Option<Span>,
    /// The value. `None` for shorthand entries (`{ build }`); for spreads,
    /// the spread argument.
    pub value: Option<Value>,
    /// From the first token of the entry to the end of its value.
    pub span: Span,
}

impl Entry {
    /// The key name, if the entry has a statically known one.
    pub fn name(&self) -> Option<&str> {
        self.key.as_ref()?.name.as_deref()
    }

    /// Whether this is a spread entry.
    pub fn is_spread(&self) -> bool {
        self.key.is_none()
    }
}

/// The key of an object entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    /// Key name after unquoting. `None` for computed keys.
    pub name: Option<String>,
    /// Syntax used for the key.
    pub kind: KeyKind,
    /// Span of the key, quotes and brackets included.
    pub span: Span,
}

/// What a top-level binding binds its value to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingKind {
    /// `export default <value>`
    ExportDefault,
    /// `module.exports = <value>`
    ModuleExports,
    /// `export = <value>`
    ExportAssignment,
    /// `const name = <value>`
    Variable(String),
}

impl BindingKind {
    /// Whether the binding is the module's export.
    pub fn is_export(&self) -> bool {
        !matches!(self, BindingKind::Variable(_))
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::ExportDefault => write!(f, "export default"),
            BindingKind::ModuleExports => write!(f, "module.exports"),
            BindingKind::ExportAssignment => write!(f, "export ="),
            BindingKind::Variable(name) => write!(f, "const {name}"),
        }
    }
}

/// A top-level binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// What the value is bound to.
    pub kind: BindingKind,
    /// Span of the binding keywords.
    pub span: Span,
    /// The bound value.
    pub value: Value,
}
