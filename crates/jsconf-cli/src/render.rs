//! Plain-text views of documents and schemas.

use std::fmt::Write;

use jsconf_complete::display_form;
use jsconf_schema::{ConfigSchema, SchemaNode, Shape};
use jsconf_tree::{Document, Entry, Span, Value};

fn span(span: Span) -> String {
    format!("[{}, {}]", span.start, span.end)
}

/// Indented outline of every binding and the values under it.
pub fn document_tree(document: &Document) -> String {
    let mut out = String::new();
    for binding in &document.bindings {
        let _ = writeln!(out, "{} {}", binding.kind, span(binding.span));
        write_value(&mut out, &binding.value, 1);
    }
    out
}

fn write_value(out: &mut String, value: &Value, indent: usize) {
    let pad = "  ".repeat(indent);
    let unclosed = |closed: bool| if closed { "" } else { " (unclosed)" };

    match value {
        Value::Object(object) => {
            let _ = writeln!(out, "{pad}Object {}{}", span(object.span), unclosed(object.closed));
            for entry in &object.entries {
                write_entry(out, entry, indent + 1);
            }
        }
        Value::Array(array) => {
            let _ = writeln!(out, "{pad}Array {}{}", span(array.span), unclosed(array.closed));
            for item in &array.items {
                write_value(out, item, indent + 1);
            }
        }
        Value::Call(call) => {
            let _ = writeln!(
                out,
                "{pad}Call {} {}{}",
                call.callee,
                span(call.span),
                unclosed(call.closed)
            );
            for arg in &call.args {
                write_value(out, arg, indent + 1);
            }
        }
        Value::Scalar(scalar) => {
            let _ = writeln!(out, "{pad}{:?}({:?}) {}", scalar.kind, scalar.text, span(scalar.span));
        }
        Value::Expr(s) => {
            let _ = writeln!(out, "{pad}Expr {}", span(*s));
        }
        Value::Missing(s) => {
            let _ = writeln!(out, "{pad}Missing {}", span(*s));
        }
    }
}

fn write_entry(out: &mut String, entry: &Entry, indent: usize) {
    let pad = "  ".repeat(indent);
    let label = match &entry.key {
        None => "...".to_string(),
        Some(key) => match &key.name {
            Some(name) => display_form(name),
            None => "[computed]".to_string(),
        },
    };
    let _ = writeln!(out, "{pad}{label}: {}", span(entry.span));
    if let Some(value) = &entry.value {
        write_value(out, value, indent + 1);
    }
}

/// Outline of a schema: one line per property with its kind, module
/// requirements and description.
pub fn schema_outline(schema: &ConfigSchema) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", schema.kind, schema.files.join(", "));
    if let Some(description) = &schema.description {
        let _ = writeln!(out, "  {description}");
    }
    write_node(&mut out, &schema.root, 1);
    out
}

fn write_node(out: &mut String, node: &SchemaNode, indent: usize) {
    match &node.shape {
        Shape::Object(properties) => {
            for (name, property) in properties {
                write_property(out, &display_form(name), property, indent);
            }
        }
        Shape::Array(element) => write_property(out, "[]", element, indent),
        Shape::Leaf => {}
    }
}

fn write_property(out: &mut String, label: &str, node: &SchemaNode, indent: usize) {
    let pad = "  ".repeat(indent);
    let _ = write!(out, "{pad}{label}: {}", node.kind());
    if !node.requires.is_empty() {
        let requires: Vec<_> = node.requires.iter().map(ToString::to_string).collect();
        let _ = write!(out, " [{}]", requires.join(", "));
    }
    if let Some(description) = &node.description {
        let _ = write!(out, " - {description}");
    }
    out.push('\n');
    write_node(out, node, indent + 1);
}
