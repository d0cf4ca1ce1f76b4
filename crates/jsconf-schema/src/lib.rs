//! Declarative schemas for configuration object literals.
//!
//! A schema is a tree of [`SchemaNode`]s, each an object with named
//! properties, an array with one element schema, or a leaf. Nodes may
//! require framework modules to be active (`"vue.config"` only with Vue),
//! which is checked against a [`VersionContext`] computed by the
//! [`VersionResolver`].

mod loader;
mod node;
mod registry;
mod version;

pub use loader::{ConfigSchema, SchemaError, SchemaErrorKind};
pub use node::{ModuleRequirement, ModuleRequirementError, NodeKind, SchemaNode, Shape};
pub use registry::{NUXT_SCHEMA_SOURCE, RegistryError, SchemaNotFound, SchemaRegistry};
pub use version::{
    Implication, ProjectDependencies, VersionContext, VersionResolver, parse_version_lenient,
};

pub use semver::Version;

/// Kind identifier of the bundled Nuxt schema.
pub const NUXT_CONFIG: &str = "nuxt-config";
