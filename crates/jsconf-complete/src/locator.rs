//! Finding the literal, key chain and sibling keys at a cursor offset.

use std::collections::BTreeSet;
use std::fmt;

use jsconf_tree::{Array, Document, Entry, Object, Span, Value};

use crate::error::CompletionError;

/// One step from the configuration root towards the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Descend into the value of a property.
    Key(String),
    /// Descend into an array element.
    Index(usize),
}

/// Property names and array indices from the configuration root to the
/// literal enclosing the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyChain(Vec<Segment>);

impl KeyChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Segment> for KeyChain {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Renders as `head.meta[0]`, with non-identifier keys quoted:
/// `["vue.config"].devtools`.
impl fmt::Display for KeyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(name) if crate::is_identifier(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                Segment::Key(name) => write!(f, "[{name:?}]")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// What kind of position the cursor is at inside the enclosing literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorSite {
    /// Where a property key goes: an empty slot or a partially typed key.
    Key,
    /// On or after the `:` of an entry, where its value goes.
    Value,
    /// Between or on the elements of an array literal.
    Element,
}

/// Where the cursor is, structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Span of the innermost object or array literal enclosing the cursor.
    pub span: Span,
    /// Chain from the configuration root to that literal.
    pub chain: KeyChain,
    /// Keys already present in the literal, without the one being typed.
    pub siblings: BTreeSet<String>,
    /// Kind of position inside the literal.
    pub site: CursorSite,
    /// Span of the key under the cursor, when one is being typed.
    pub typed: Option<Span>,
}

/// Locate `offset` inside the configuration object of `document`.
pub fn locate(document: &Document, offset: u32) -> Result<Location, CompletionError> {
    let root = document
        .config_root()
        .ok_or(CompletionError::NotInsideLiteral)?;
    if !within(root.span, root.closed, offset) {
        return Err(CompletionError::NotInsideLiteral);
    }
    locate_in_object(root, offset, KeyChain::new())
}

/// Whether `offset` is inside a literal. Unclosed literals run to end of
/// input, which counts as inside.
fn within(span: Span, closed: bool, offset: u32) -> bool {
    if closed {
        span.encloses(offset)
    } else {
        span.start < offset && offset <= span.end
    }
}

fn locate_in_object(
    object: &Object,
    offset: u32,
    mut chain: KeyChain,
) -> Result<Location, CompletionError> {
    let mut typed = None;
    let mut site = CursorSite::Key;

    for (index, entry) in object.entries.iter().enumerate() {
        let name = entry.name();

        match &entry.value {
            Some(Value::Object(inner)) if within(inner.span, inner.closed, offset) => {
                let Some(name) = name else {
                    return Err(unnamed_entry(&chain, entry));
                };
                chain.push(Segment::Key(name.to_string()));
                return locate_in_object(inner, offset, chain);
            }
            Some(Value::Array(inner)) if within(inner.span, inner.closed, offset) => {
                let Some(name) = name else {
                    return Err(unnamed_entry(&chain, entry));
                };
                chain.push(Segment::Key(name.to_string()));
                return locate_in_array(inner, offset, chain);
            }
            // Method bodies, calls and other expressions hold code, not keys.
            Some(value) if !value.is_literal() && value.span().encloses(offset) => {
                site = CursorSite::Value;
                break;
            }
            _ => {}
        }

        if entry.is_spread() && entry.span.start < offset && offset <= entry.span.end {
            site = CursorSite::Value;
            break;
        }

        if let Some(key) = &entry.key
            && key.name.is_some()
            && key.span.touches(offset)
        {
            typed = Some((index, key.span));
            break;
        }

        if let Some(colon) = entry.colon
            && colon.end <= offset
            && offset <= entry.span.end
        {
            site = CursorSite::Value;
            break;
        }
    }

    let siblings = object
        .entries
        .iter()
        .enumerate()
        .filter(|(index, _)| typed.is_none_or(|(typed_index, _)| *index != typed_index))
        .filter_map(|(_, entry)| entry.name().map(str::to_string))
        .collect();

    Ok(Location {
        span: object.span,
        chain,
        siblings,
        site,
        typed: typed.map(|(_, span)| span),
    })
}

/// A literal under a spread or computed key has no schema path.
fn unnamed_entry(chain: &KeyChain, entry: &Entry) -> CompletionError {
    let marker = if entry.is_spread() { "..." } else { "[?]" };
    CompletionError::NoSuchSchemaPath {
        path: format!("{chain}{marker}"),
    }
}

fn locate_in_array(
    array: &Array,
    offset: u32,
    mut chain: KeyChain,
) -> Result<Location, CompletionError> {
    for (index, item) in array.items.iter().enumerate() {
        match item {
            Value::Object(inner) if within(inner.span, inner.closed, offset) => {
                chain.push(Segment::Index(index));
                return locate_in_object(inner, offset, chain);
            }
            Value::Array(inner) if within(inner.span, inner.closed, offset) => {
                chain.push(Segment::Index(index));
                return locate_in_array(inner, offset, chain);
            }
            _ => {}
        }
    }

    Ok(Location {
        span: array.span,
        chain,
        siblings: BTreeSet::new(),
        site: CursorSite::Element,
        typed: None,
    })
}
