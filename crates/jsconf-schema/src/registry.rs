//! The schema registry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::debug;

use crate::loader::{ConfigSchema, SchemaError};
use crate::node::SchemaNode;

/// The bundled Nuxt configuration schema.
pub const NUXT_SCHEMA_SOURCE: &str = include_str!("../schemas/nuxt.json");

/// Schemas by configuration kind.
///
/// Built once and read-only afterwards; lookups take `&self` and the
/// registry is `Sync`, so one instance serves concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, ConfigSchema>,
}

/// No schema is registered for a configuration kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNotFound {
    /// The kind that was asked for.
    pub kind: String,
}

impl std::fmt::Display for SchemaNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no schema registered for configuration kind `{}`", self.kind)
    }
}

impl std::error::Error for SchemaNotFound {}

/// Error adding a schema to a registry.
#[derive(Debug)]
pub enum RegistryError {
    /// The schema definition is malformed.
    Schema(SchemaError),
    /// A schema for this kind is already registered.
    DuplicateKind(String),
    /// The schema file could not be read.
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::Schema(e) => write!(f, "{e}"),
            RegistryError::DuplicateKind(kind) => {
                write!(f, "a schema for `{kind}` is already registered")
            }
            RegistryError::Io { path, error } => {
                write!(f, "failed to read {}: {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Schema(e) => Some(e),
            RegistryError::Io { error, .. } => Some(error),
            RegistryError::DuplicateKind(_) => None,
        }
    }
}

impl From<SchemaError> for RegistryError {
    fn from(e: SchemaError) -> Self {
        RegistryError::Schema(e)
    }
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bundled schemas.
    pub fn with_bundled() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register_source(NUXT_SCHEMA_SOURCE)?;
        Ok(registry)
    }

    /// The process-wide registry of bundled schemas, built on first use.
    ///
    /// # Panics
    ///
    /// Panics if a bundled schema is malformed, which the test suite rules
    /// out.
    pub fn builtin() -> &'static SchemaRegistry {
        static BUILTIN: OnceLock<SchemaRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| match Self::with_bundled() {
            Ok(registry) => registry,
            Err(e) => panic!("bundled schema is invalid: {e}"),
        })
    }

    /// Add a schema. Fails if its kind is already registered.
    pub fn register(&mut self, schema: ConfigSchema) -> Result<&ConfigSchema, RegistryError> {
        use std::collections::btree_map::Entry;
        match self.schemas.entry(schema.kind.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateKind(schema.kind)),
            Entry::Vacant(slot) => {
                debug!(kind = %schema.kind, files = ?schema.files, "registered schema");
                Ok(slot.insert(schema))
            }
        }
    }

    /// Parse and add a schema definition.
    pub fn register_source(&mut self, source: &str) -> Result<&ConfigSchema, RegistryError> {
        let schema = ConfigSchema::from_json(source)?;
        self.register(schema)
    }

    /// Read, parse and add a schema file.
    pub fn load_file(&mut self, path: &Path) -> Result<&ConfigSchema, RegistryError> {
        let source = std::fs::read_to_string(path).map_err(|error| RegistryError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        self.register_source(&source)
    }

    /// The root schema node for a configuration kind.
    pub fn get_root_schema(&self, kind: &str) -> Result<&SchemaNode, SchemaNotFound> {
        self.get(kind).map(|s| &s.root).ok_or_else(|| SchemaNotFound {
            kind: kind.to_string(),
        })
    }

    /// The full schema for a configuration kind.
    pub fn get(&self, kind: &str) -> Option<&ConfigSchema> {
        self.schemas.get(kind)
    }

    /// The configuration kind that applies to a file, by file name.
    pub fn kind_for_path(&self, path: &Path) -> Option<&str> {
        let file_name = path.file_name()?.to_str()?;
        self.schemas
            .values()
            .find(|s| s.matches_file_name(file_name))
            .map(|s| s.kind.as_str())
    }

    /// Registered kinds in name order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Registered schemas in kind order.
    pub fn schemas(&self) -> impl Iterator<Item = &ConfigSchema> {
        self.schemas.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = r#"{
        "kind": "demo",
        "files": ["demo.config.js", "demo.config.ts"],
        "root": { "kind": "object", "properties": { "a": "leaf" } }
    }"#;

    #[test]
    fn unknown_kind_is_not_found() {
        let registry = SchemaRegistry::new();
        let err = registry.get_root_schema("nope").unwrap_err();
        assert_eq!(err.kind, "nope");
        assert_eq!(
            err.to_string(),
            "no schema registered for configuration kind `nope`"
        );
    }

    #[test]
    fn register_and_look_up() {
        let mut registry = SchemaRegistry::new();
        registry.register_source(DEMO).unwrap();
        assert!(registry.get_root_schema("demo").unwrap().property("a").is_some());
        assert_eq!(
            registry.kind_for_path(Path::new("/app/demo.config.ts")),
            Some("demo")
        );
        assert_eq!(registry.kind_for_path(Path::new("/app/other.js")), None);
        assert_eq!(registry.kinds().collect::<Vec<_>>(), vec!["demo"]);
    }

    #[test]
    fn duplicate_kind_is_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.register_source(DEMO).unwrap();
        let err = registry.register_source(DEMO).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateKind(ref k) if k == "demo"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .load_file(Path::new("/definitely/not/here.json"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
    }

    #[test]
    fn builtin_is_memoized() {
        let a = SchemaRegistry::builtin() as *const SchemaRegistry;
        let b = SchemaRegistry::builtin() as *const SchemaRegistry;
        assert_eq!(a, b);
    }

    #[test]
    fn registry_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<SchemaRegistry>();
    }
}
