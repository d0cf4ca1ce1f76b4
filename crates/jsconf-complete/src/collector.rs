//! Turning a matched schema node into sorted candidates.

use std::collections::BTreeSet;

use jsconf_schema::{SchemaNode, Shape, VersionContext};

use crate::error::CompletionError;

/// A property name offered at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    /// The property name.
    pub name: String,
    /// How the name is written as a key: bare when it is an identifier,
    /// double-quoted otherwise (`"vue.config"`).
    pub display: String,
    /// Description from the schema.
    pub detail: Option<String>,
}

impl CompletionCandidate {
    /// A candidate for the property `name`.
    pub fn new(name: impl Into<String>, detail: Option<String>) -> Self {
        let name = name.into();
        Self {
            display: display_form(&name),
            name,
            detail,
        }
    }
}

/// Whether `name` can be written as a bare object key.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// `name` as it is written as an object key.
pub fn display_form(name: &str) -> String {
    if is_identifier(name) {
        return name.to_string();
    }
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// The properties of an object node that are available in `context` and
/// not already in `siblings`, ordered byte-wise by display form.
///
/// Quotes take part in the comparison, so `"vue.config"` sorts before
/// `build`.
pub fn collect(
    node: &SchemaNode,
    context: &VersionContext,
    siblings: &BTreeSet<String>,
) -> Result<Vec<CompletionCandidate>, CompletionError> {
    let Shape::Object(properties) = &node.shape else {
        return Err(CompletionError::NotCompletable { kind: node.kind() });
    };

    let mut candidates: Vec<_> = properties
        .iter()
        .filter(|(name, property)| !siblings.contains(*name) && property.is_available(context))
        .map(|(name, property)| CompletionCandidate::new(name.as_str(), property.description.clone()))
        .collect();
    candidates.sort_by(|a, b| a.display.cmp(&b.display));
    Ok(candidates)
}
