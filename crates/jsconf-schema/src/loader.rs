//! Loading schema definitions from JSON.
//!
//! Schemas are walked by hand rather than derived so that every error can
//! name the schema path it was found at, e.g. `root.head.meta[]`.

use std::collections::BTreeMap;

use ariadne::{Color, Label, Report, ReportKind, Source};
use serde_json::{Map, Value};

use crate::node::{ModuleRequirement, SchemaNode, Shape};

/// A schema for one kind of configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSchema {
    /// Identifier of the configuration kind, e.g. `nuxt-config`.
    pub kind: String,
    /// File names this kind applies to, e.g. `nuxt.config.js`.
    pub files: Vec<String>,
    /// Human-readable description.
    pub description: Option<String>,
    /// Schema of the configuration object.
    pub root: SchemaNode,
}

impl ConfigSchema {
    /// Parse a schema definition.
    pub fn from_json(source: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(source).map_err(|e| SchemaError {
            path: String::new(),
            kind: SchemaErrorKind::Syntax {
                line: e.line(),
                column: e.column(),
                message: e.to_string(),
            },
        })?;
        load_document(&value)
    }

    /// Whether this kind applies to a file with the given name.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        self.files.iter().any(|f| f == file_name)
    }
}

/// A malformed schema definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Where in the schema the problem is, e.g. `root.head.meta[]`. Empty
    /// for problems with the file as a whole.
    pub path: String,
    /// What is wrong.
    pub kind: SchemaErrorKind,
}

/// Kinds of schema errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// The file is not valid JSON.
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    /// A value has the wrong JSON type.
    ExpectedType(&'static str),
    /// `kind` is not `object`, `array` or `leaf`.
    UnknownKind(String),
    /// A required field is absent.
    MissingField(&'static str),
    /// A field that is not part of the format.
    UnknownField(String),
    /// A field that does not apply to this node kind, e.g. `properties` on
    /// an array.
    MisplacedField { field: &'static str, kind: String },
    /// An object node without properties.
    EmptyObject,
    /// A property with an empty name.
    EmptyPropertyName,
    /// A `modules` entry that does not parse.
    InvalidModule { requirement: String, message: String },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            SchemaErrorKind::Syntax {
                line,
                column,
                message,
            } => return write!(f, "invalid JSON at {line}:{column}: {message}"),
            SchemaErrorKind::ExpectedType(expected) => write!(f, "expected {expected}"),
            SchemaErrorKind::UnknownKind(kind) => {
                write!(f, "unknown node kind `{kind}` (expected object, array or leaf)")
            }
            SchemaErrorKind::MissingField(field) => write!(f, "missing field `{field}`"),
            SchemaErrorKind::UnknownField(field) => write!(f, "unknown field `{field}`"),
            SchemaErrorKind::MisplacedField { field, kind } => {
                write!(f, "`{field}` is not allowed on {kind} nodes")
            }
            SchemaErrorKind::EmptyObject => write!(f, "object node has no properties"),
            SchemaErrorKind::EmptyPropertyName => write!(f, "property name is empty"),
            SchemaErrorKind::InvalidModule {
                requirement,
                message,
            } => write!(f, "invalid module requirement `{requirement}`: {message}"),
        }?;
        if !self.path.is_empty() {
            write!(f, " at `{}`", self.path)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

impl SchemaError {
    fn at(path: &str, kind: SchemaErrorKind) -> Self {
        Self {
            path: path.to_string(),
            kind,
        }
    }

    /// Byte range in `source` this error points at, when it can be located.
    ///
    /// Syntax errors carry a line and column. Other errors point at the key
    /// of the last path segment if that key appears once in the source.
    pub fn source_range(&self, source: &str) -> Option<std::ops::Range<usize>> {
        if let SchemaErrorKind::Syntax { line, column, .. } = &self.kind {
            let line_start: usize = source
                .split_inclusive('\n')
                .take(line.saturating_sub(1))
                .map(str::len)
                .sum();
            let offset = (line_start + column.saturating_sub(1)).min(source.len());
            return Some(offset..offset);
        }

        let segment = last_segment(&self.path)?;
        let needle = format!("\"{segment}\"");
        let mut found = source.match_indices(&needle);
        let (start, _) = found.next()?;
        if found.next().is_some() {
            return None;
        }
        Some(start..start + needle.len())
    }

    /// Render this error with ariadne.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let range = self.source_range(source).unwrap_or(0..0);
        let mut report = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(self.to_string());
        if self.source_range(source).is_some() {
            report = report.with_label(
                Label::new((filename, range))
                    .with_message(self.label())
                    .with_color(Color::Red),
            );
        }
        if let Some(help) = self.help() {
            report = report.with_help(help);
        }
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn label(&self) -> &'static str {
        match self.kind {
            SchemaErrorKind::Syntax { .. } => "here",
            SchemaErrorKind::UnknownField(_) | SchemaErrorKind::MisplacedField { .. } => {
                "not allowed here"
            }
            _ => "in this node",
        }
    }

    fn help(&self) -> Option<&'static str> {
        match self.kind {
            SchemaErrorKind::UnknownKind(_) => Some("use \"object\", \"array\" or \"leaf\""),
            SchemaErrorKind::MisplacedField { .. } => {
                Some("`properties` belongs on object nodes, `elementSchema` on array nodes")
            }
            SchemaErrorKind::EmptyObject => Some("declare at least one property, or use \"leaf\""),
            SchemaErrorKind::InvalidModule { .. } => {
                Some("modules are written `name` or `name@<semver range>`")
            }
            _ => None,
        }
    }
}

fn last_segment(path: &str) -> Option<&str> {
    let path = path.trim_end_matches("[]");
    if let Some(stripped) = path.strip_suffix("\"]") {
        let start = stripped.rfind("[\"")?;
        return Some(&stripped[start + 2..]);
    }
    let start = path.rfind('.').map_or(0, |i| i + 1);
    let segment = &path[start..];
    (!segment.is_empty()).then_some(segment)
}

/// Path of the property `name` under `parent`.
fn child_path(parent: &str, name: &str) -> String {
    let is_ident = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if is_ident {
        format!("{parent}.{name}")
    } else {
        format!("{parent}[\"{name}\"]")
    }
}

fn load_document(value: &Value) -> Result<ConfigSchema, SchemaError> {
    let map = value
        .as_object()
        .ok_or_else(|| SchemaError::at("", SchemaErrorKind::ExpectedType("an object")))?;

    for field in map.keys() {
        if !matches!(field.as_str(), "$schema" | "kind" | "files" | "description" | "root") {
            return Err(SchemaError::at("", SchemaErrorKind::UnknownField(field.clone())));
        }
    }

    let kind = match map.get("kind") {
        Some(Value::String(kind)) if !kind.is_empty() => kind.clone(),
        Some(_) => {
            return Err(SchemaError::at(
                "kind",
                SchemaErrorKind::ExpectedType("a non-empty string"),
            ));
        }
        None => return Err(SchemaError::at("", SchemaErrorKind::MissingField("kind"))),
    };

    let files = match map.get("files") {
        None => Vec::new(),
        Some(Value::Array(files)) => files
            .iter()
            .map(|f| {
                f.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| SchemaError::at("files", SchemaErrorKind::ExpectedType("a string")))
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(SchemaError::at(
                "files",
                SchemaErrorKind::ExpectedType("an array of strings"),
            ));
        }
    };

    let description = load_description(map, "description")?;

    let root_value = map
        .get("root")
        .ok_or_else(|| SchemaError::at("", SchemaErrorKind::MissingField("root")))?;
    let root = load_node(root_value, "root", None)?;
    if !matches!(root.shape, Shape::Object(_)) {
        return Err(SchemaError::at(
            "root",
            SchemaErrorKind::ExpectedType("an object node"),
        ));
    }

    Ok(ConfigSchema {
        kind,
        files,
        description,
        root,
    })
}

fn load_description(map: &Map<String, Value>, path: &str) -> Result<Option<String>, SchemaError> {
    match map.get("description") {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SchemaError::at(path, SchemaErrorKind::ExpectedType("a string"))),
    }
}

fn load_node(value: &Value, path: &str, name: Option<&str>) -> Result<SchemaNode, SchemaError> {
    let map = match value {
        Value::String(s) if s == "leaf" => {
            return Ok(SchemaNode {
                name: name.map(str::to_string),
                ..SchemaNode::leaf()
            });
        }
        Value::String(s) => {
            return Err(SchemaError::at(path, SchemaErrorKind::UnknownKind(s.clone())));
        }
        Value::Object(map) => map,
        _ => {
            return Err(SchemaError::at(
                path,
                SchemaErrorKind::ExpectedType("a schema node object or \"leaf\""),
            ));
        }
    };

    for field in map.keys() {
        if !matches!(
            field.as_str(),
            "kind" | "properties" | "elementSchema" | "modules" | "description"
        ) {
            return Err(SchemaError::at(path, SchemaErrorKind::UnknownField(field.clone())));
        }
    }

    let kind = match map.get("kind") {
        Some(Value::String(kind)) => kind.as_str(),
        Some(_) => return Err(SchemaError::at(path, SchemaErrorKind::ExpectedType("`kind` to be a string"))),
        None => return Err(SchemaError::at(path, SchemaErrorKind::MissingField("kind"))),
    };

    let misplaced = |field: &'static str| {
        SchemaError::at(
            path,
            SchemaErrorKind::MisplacedField {
                field,
                kind: kind.to_string(),
            },
        )
    };

    let shape = match kind {
        "object" => {
            if map.contains_key("elementSchema") {
                return Err(misplaced("elementSchema"));
            }
            let properties = match map.get("properties") {
                Some(Value::Object(properties)) => properties,
                Some(_) => {
                    return Err(SchemaError::at(
                        path,
                        SchemaErrorKind::ExpectedType("`properties` to be an object"),
                    ));
                }
                None => return Err(SchemaError::at(path, SchemaErrorKind::MissingField("properties"))),
            };
            if properties.is_empty() {
                return Err(SchemaError::at(path, SchemaErrorKind::EmptyObject));
            }
            let mut children = BTreeMap::new();
            for (child_name, child) in properties {
                if child_name.is_empty() {
                    return Err(SchemaError::at(path, SchemaErrorKind::EmptyPropertyName));
                }
                let child_path = child_path(path, child_name);
                let node = load_node(child, &child_path, Some(child_name))?;
                children.insert(child_name.clone(), node);
            }
            Shape::Object(children)
        }
        "array" => {
            if map.contains_key("properties") {
                return Err(misplaced("properties"));
            }
            let element = map
                .get("elementSchema")
                .ok_or_else(|| SchemaError::at(path, SchemaErrorKind::MissingField("elementSchema")))?;
            Shape::Array(Box::new(load_node(element, &format!("{path}[]"), None)?))
        }
        "leaf" => {
            if map.contains_key("properties") {
                return Err(misplaced("properties"));
            }
            if map.contains_key("elementSchema") {
                return Err(misplaced("elementSchema"));
            }
            Shape::Leaf
        }
        other => return Err(SchemaError::at(path, SchemaErrorKind::UnknownKind(other.to_string()))),
    };

    let requires = match map.get("modules") {
        None => Vec::new(),
        Some(Value::Array(modules)) => modules
            .iter()
            .map(|m| load_requirement(m, path))
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(SchemaError::at(
                path,
                SchemaErrorKind::ExpectedType("`modules` to be an array of strings"),
            ));
        }
    };

    Ok(SchemaNode {
        name: name.map(str::to_string),
        shape,
        requires,
        description: load_description(map, path)?,
    })
}

fn load_requirement(value: &Value, path: &str) -> Result<ModuleRequirement, SchemaError> {
    let raw = value.as_str().ok_or_else(|| {
        SchemaError::at(
            path,
            SchemaErrorKind::ExpectedType("`modules` to be an array of strings"),
        )
    })?;
    raw.parse().map_err(|e: crate::node::ModuleRequirementError| {
        SchemaError::at(
            path,
            SchemaErrorKind::InvalidModule {
                requirement: raw.to_string(),
                message: e.to_string(),
            },
        )
    })
}
