//! User configuration for the jsconf language server.
//!
//! Configuration is stored at `~/.config/jsconf/config.json` and lists extra
//! schema files plus the modules to assume when a project has no
//! `package.json`.

use std::path::{Path, PathBuf};

use jsconf_schema::{ProjectDependencies, RegistryError, SchemaRegistry};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// User configuration for the language server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct JsconfUserConfig {
    /// Schema files registered next to the bundled ones. Relative paths are
    /// resolved against the directory of the configuration file.
    pub schemas: Vec<PathBuf>,

    /// Dependencies assumed for documents outside any project, written as
    /// `package@range` (`nuxt@2.8.1`) or a bare package name.
    pub default_modules: Vec<String>,
}

impl JsconfUserConfig {
    /// Parse a configuration file's contents.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// The bundled schemas plus [`schemas`](Self::schemas).
    pub fn registry(&self) -> Result<SchemaRegistry, RegistryError> {
        let mut registry = SchemaRegistry::with_bundled()?;
        for path in &self.schemas {
            let schema = registry.load_file(path)?;
            info!(kind = %schema.kind, path = %path.display(), "Registered user schema");
        }
        Ok(registry)
    }

    /// [`default_modules`](Self::default_modules) as dependencies.
    pub fn default_dependencies(&self) -> ProjectDependencies {
        let mut dependencies = ProjectDependencies::new();
        for spec in &self.default_modules {
            dependencies.add_spec(spec);
        }
        dependencies
    }

    fn resolve_paths(mut self, base: &Path) -> Self {
        for path in &mut self.schemas {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

/// Get the path to the user config file.
///
/// Returns `~/.config/jsconf/config.json` on Linux, or the equivalent
/// platform-specific config directory elsewhere.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("jsconf").join("config.json"))
}

/// Load the user configuration from [`config_path`].
///
/// Returns `Ok(None)` if there is no config file.
pub fn load_config() -> Result<Option<JsconfUserConfig>, LoadConfigError> {
    let Some(path) = config_path() else {
        debug!("No config directory available");
        return Ok(None);
    };
    load_config_from(&path)
}

/// Load the user configuration from `path`.
///
/// Returns `Ok(None)` if the file doesn't exist and `Err` if it exists but
/// can't be read or parsed.
pub fn load_config_from(path: &Path) -> Result<Option<JsconfUserConfig>, LoadConfigError> {
    if !path.exists() {
        debug!(?path, "Config file does not exist");
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| LoadConfigError::Io {
        path: path.to_path_buf(),
        error: e,
    })?;

    let config = JsconfUserConfig::from_json(&content).map_err(|e| LoadConfigError::Parse {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    let config = match path.parent() {
        Some(base) => config.resolve_paths(base),
        None => config,
    };

    info!(
        ?path,
        schemas = config.schemas.len(),
        default_modules = config.default_modules.len(),
        "Loaded user config"
    );
    Ok(Some(config))
}

/// [`load_config`], falling back to the defaults when the file is broken.
pub fn load_config_or_default() -> JsconfUserConfig {
    match load_config() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            warn!("{e}");
            JsconfUserConfig::default()
        }
    }
}

/// Error loading the user config.
#[derive(Debug)]
pub enum LoadConfigError {
    Io { path: PathBuf, error: std::io::Error },
    Parse { path: PathBuf, error: String },
}

impl std::fmt::Display for LoadConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadConfigError::Io { path, error } => {
                write!(f, "Failed to read config at {}: {}", path.display(), error)
            }
            LoadConfigError::Parse { path, error } => {
                write!(f, "Failed to parse config at {}: {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for LoadConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config_from(&dir.path().join("config.json")).unwrap(), None);
    }

    #[test]
    fn relative_schema_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "schemas": ["vite.json", "/abs/x.json"], "defaultModules": ["nuxt@2.8.1"] }"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap().unwrap();
        assert_eq!(
            config.schemas,
            vec![dir.path().join("vite.json"), PathBuf::from("/abs/x.json")]
        );
        assert_eq!(
            config.default_dependencies().iter().collect::<Vec<_>>(),
            vec![("nuxt", "2.8.1")]
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "schema": [] }"#).unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, LoadConfigError::Parse { .. }));
        assert!(err.to_string().contains("unknown field `schema`"), "{err}");
    }

    #[test]
    fn user_schemas_join_the_bundled_ones() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("vite.json");
        std::fs::write(
            &schema,
            r#"{
                "kind": "vite-config",
                "files": ["vite.config.ts"],
                "root": { "kind": "object", "properties": { "base": "leaf" } }
            }"#,
        )
        .unwrap();
        let config = JsconfUserConfig {
            schemas: vec![schema],
            ..Default::default()
        };
        let registry = config.registry().unwrap();
        assert_eq!(
            registry.kinds().collect::<Vec<_>>(),
            vec!["nuxt-config", "vite-config"]
        );
    }
}
