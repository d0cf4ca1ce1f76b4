//! Per-project version contexts, read from the nearest `package.json`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use jsconf_schema::{ProjectDependencies, VersionContext, VersionResolver};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Version contexts keyed by the directory of the documents that use them.
#[derive(Debug)]
pub struct ProjectContexts {
    loader: ContextLoader,
    cache: HashMap<PathBuf, VersionContext>,
}

/// Reads the context for one directory from disk.
#[derive(Debug, Clone)]
struct ContextLoader {
    resolver: VersionResolver,
    /// Used when no `package.json` is found or it can't be read.
    fallback: VersionContext,
}

impl ProjectContexts {
    pub fn new(resolver: VersionResolver, fallback: &ProjectDependencies) -> Self {
        let fallback = resolver.resolve(fallback);
        Self {
            loader: ContextLoader { resolver, fallback },
            cache: HashMap::new(),
        }
    }

    /// Forget everything read so far, e.g. after a `package.json` changed.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Number of directories with a cached context.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// The context for a document at `path`.
///
/// Cache misses read the file system on the blocking pool; the lock is not
/// held while they do.
pub async fn context_for(projects: &RwLock<ProjectContexts>, path: &Path) -> VersionContext {
    let (dir, loader) = {
        let projects = projects.read().await;
        let Some(dir) = path.parent() else {
            return projects.loader.fallback.clone();
        };
        if let Some(context) = projects.cache.get(dir) {
            return context.clone();
        }
        (dir.to_path_buf(), projects.loader.clone())
    };

    let fallback = loader.fallback.clone();
    let key = dir.clone();
    let context = match tokio::task::spawn_blocking(move || loader.load(&dir)).await {
        Ok(context) => context,
        Err(e) => {
            warn!("Reading project modules failed: {e}");
            return fallback;
        }
    };

    projects.write().await.cache.insert(key, context.clone());
    context
}

impl ContextLoader {
    fn load(&self, dir: &Path) -> VersionContext {
        let Some(manifest) = find_package_json(dir) else {
            debug!(dir = %dir.display(), "No package.json, using default modules");
            return self.fallback.clone();
        };
        let dependencies = std::fs::read_to_string(&manifest)
            .map_err(|e| e.to_string())
            .and_then(|source| {
                ProjectDependencies::from_package_json(&source).map_err(|e| e.to_string())
            });
        match dependencies {
            Ok(dependencies) => {
                let context = self.resolver.resolve(&dependencies);
                debug!(manifest = %manifest.display(), ?context, "Resolved project modules");
                context
            }
            Err(e) => {
                warn!(manifest = %manifest.display(), "Ignoring unreadable package.json: {e}");
                self.fallback.clone()
            }
        }
    }
}

/// The nearest `package.json` in `dir` or one of its ancestors.
pub fn find_package_json(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .map(|ancestor| ancestor.join("package.json"))
        .find(|candidate| candidate.is_file())
}
