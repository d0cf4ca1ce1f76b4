//! Schema nodes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use semver::VersionReq;

use crate::version::VersionContext;

/// One point in a configuration schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// Property name under the parent. `None` for roots and array elements.
    pub name: Option<String>,
    /// Shape of the values accepted here.
    pub shape: Shape,
    /// Modules that must be active for this node to be offered.
    pub requires: Vec<ModuleRequirement>,
    /// Human-readable description.
    pub description: Option<String>,
}

/// What a schema node accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// An object literal with the given properties.
    Object(BTreeMap<String, SchemaNode>),
    /// An array literal whose elements all follow one schema.
    Array(Box<SchemaNode>),
    /// Anything without completable structure.
    Leaf,
}

/// The discriminant of a [`Shape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    Leaf,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Object => "object",
            NodeKind::Array => "array",
            NodeKind::Leaf => "leaf",
        })
    }
}

impl SchemaNode {
    /// A leaf node.
    pub fn leaf() -> Self {
        Self::with_shape(Shape::Leaf)
    }

    /// An object node. Each property takes its map key as its name.
    pub fn object(properties: impl IntoIterator<Item = (String, SchemaNode)>) -> Self {
        let properties = properties
            .into_iter()
            .map(|(name, mut node)| {
                node.name = Some(name.clone());
                (name, node)
            })
            .collect();
        Self::with_shape(Shape::Object(properties))
    }

    /// An array node.
    pub fn array(element: SchemaNode) -> Self {
        Self::with_shape(Shape::Array(Box::new(element)))
    }

    fn with_shape(shape: Shape) -> Self {
        Self {
            name: None,
            shape,
            requires: Vec::new(),
            description: None,
        }
    }

    /// Add a module requirement.
    pub fn requiring(mut self, requirement: ModuleRequirement) -> Self {
        self.requires.push(requirement);
        self
    }

    /// Set the description.
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> NodeKind {
        match self.shape {
            Shape::Object(_) => NodeKind::Object,
            Shape::Array(_) => NodeKind::Array,
            Shape::Leaf => NodeKind::Leaf,
        }
    }

    /// The declared properties, for object nodes.
    pub fn properties(&self) -> Option<&BTreeMap<String, SchemaNode>> {
        match &self.shape {
            Shape::Object(properties) => Some(properties),
            _ => None,
        }
    }

    /// A declared property, for object nodes.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties()?.get(name)
    }

    /// The element schema, for array nodes.
    pub fn element(&self) -> Option<&SchemaNode> {
        match &self.shape {
            Shape::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Whether every module this node requires is active in `context`.
    pub fn is_available(&self, context: &VersionContext) -> bool {
        self.requires.iter().all(|r| r.is_satisfied_by(context))
    }
}

/// A module that must be active, optionally within a version range.
///
/// Written as `name` or `name@<range>`, e.g. `vue`, `nuxt@>=2.13.0` or
/// `@nuxtjs/pwa@^3`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRequirement {
    /// Module identifier.
    pub name: String,
    /// Accepted versions. `None` means any version, known or not.
    pub version: Option<VersionReq>,
}

impl ModuleRequirement {
    /// Require a module at any version.
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Whether `context` satisfies this requirement.
    ///
    /// A requirement without a range is satisfied by presence. A ranged
    /// requirement needs a known version inside the range.
    pub fn is_satisfied_by(&self, context: &VersionContext) -> bool {
        match (&self.version, context.get(&self.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(req), Some(version)) => version.as_ref().is_some_and(|v| req.matches(v)),
        }
    }
}

/// Error parsing a [`ModuleRequirement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleRequirementError {
    /// The module name is empty.
    EmptyName,
    /// The version range does not parse.
    InvalidRange { range: String, message: String },
}

impl fmt::Display for ModuleRequirementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleRequirementError::EmptyName => write!(f, "module name is empty"),
            ModuleRequirementError::InvalidRange { range, message } => {
                write!(f, "invalid version range `{range}`: {message}")
            }
        }
    }
}

impl std::error::Error for ModuleRequirementError {}

impl FromStr for ModuleRequirement {
    type Err = ModuleRequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // The first character may be the `@` of a scoped package name.
        let split = s
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '@')
            .map(|(i, _)| i);
        let (name, range) = match split {
            Some(i) => (&s[..i], Some(&s[i + 1..])),
            None => (s, None),
        };
        if name.is_empty() {
            return Err(ModuleRequirementError::EmptyName);
        }
        let version = range
            .map(|range| {
                VersionReq::parse(range).map_err(|e| ModuleRequirementError::InvalidRange {
                    range: range.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;
        Ok(Self {
            name: name.to_string(),
            version,
        })
    }
}

impl fmt::Display for ModuleRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(req) => write!(f, "{}@{}", self.name, req),
            None => f.write_str(&self.name),
        }
    }
}
