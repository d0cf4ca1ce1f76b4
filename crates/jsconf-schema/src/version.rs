//! Module and version resolution.
//!
//! A [`VersionContext`] is the set of framework modules active for a
//! project, each with a version when one is known. It is computed by a
//! [`VersionResolver`] from the dependencies a project declares.

use std::collections::BTreeMap;

use semver::Version;
use serde::Deserialize;
use tracing::debug;

use crate::node::ModuleRequirement;

/// Active modules for one project, with their versions when known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionContext {
    modules: BTreeMap<String, Option<Version>>,
}

impl VersionContext {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module, replacing any previous entry for it.
    pub fn insert(&mut self, name: impl Into<String>, version: Option<Version>) {
        self.modules.insert(name.into(), version);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, version: Option<Version>) -> Self {
        self.insert(name, version);
        self
    }

    /// Remove a module.
    pub fn remove(&mut self, name: &str) -> Option<Option<Version>> {
        self.modules.remove(name)
    }

    /// The entry for a module: `None` if absent, `Some(None)` if present with
    /// an unknown version.
    pub fn get(&self, name: &str) -> Option<&Option<Version>> {
        self.modules.get(name)
    }

    /// Whether a module is present.
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// The known version of a module.
    pub fn version(&self, name: &str) -> Option<&Version> {
        self.modules.get(name)?.as_ref()
    }

    /// Active modules in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Version>)> {
        self.modules.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl FromIterator<(String, Option<Version>)> for VersionContext {
    fn from_iter<I: IntoIterator<Item = (String, Option<Version>)>>(iter: I) -> Self {
        Self {
            modules: iter.into_iter().collect(),
        }
    }
}

/// Dependencies a project declares, as `(package, version range)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDependencies {
    declared: Vec<(String, String)>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    peer_dependencies: BTreeMap<String, String>,
}

impl ProjectDependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a dependency.
    pub fn add(&mut self, package: impl Into<String>, version: impl Into<String>) {
        self.declared.push((package.into(), version.into()));
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, package: impl Into<String>, version: impl Into<String>) -> Self {
        self.add(package, version);
        self
    }

    /// Declare a dependency written as `package@range`, e.g. `nuxt@2.8.1`
    /// or `@nuxt/core@^2`. Without a range the package is declared at an
    /// unknown version.
    pub fn add_spec(&mut self, spec: &str) {
        let spec = spec.trim();
        match spec.char_indices().skip(1).find(|(_, c)| *c == '@') {
            Some((i, _)) => self.add(&spec[..i], &spec[i + 1..]),
            None => self.add(spec, "*"),
        }
    }

    /// Read the dependency sections of a `package.json`: `dependencies`,
    /// `devDependencies` and `peerDependencies`, in that order.
    pub fn from_package_json(source: &str) -> Result<Self, serde_json::Error> {
        let package: PackageJson = serde_json::from_str(source)?;
        let declared = package
            .dependencies
            .into_iter()
            .chain(package.dev_dependencies)
            .chain(package.peer_dependencies)
            .collect();
        Ok(Self { declared })
    }

    /// Declared `(package, version range)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declared.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }
}

impl<P: Into<String>, V: Into<String>> FromIterator<(P, V)> for ProjectDependencies {
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        Self {
            declared: iter.into_iter().map(|(p, v)| (p.into(), v.into())).collect(),
        }
    }
}

/// A module that becomes active when another requirement holds, e.g. Nuxt 2
/// bundles Vue 2.6.
#[derive(Debug, Clone, PartialEq)]
pub struct Implication {
    /// When this holds...
    pub when: ModuleRequirement,
    /// ...this module is active...
    pub module: String,
    /// ...at this version.
    pub version: Version,
}

/// Maps declared dependencies to a [`VersionContext`].
#[derive(Debug, Clone, PartialEq)]
pub struct VersionResolver {
    aliases: BTreeMap<String, String>,
    implications: Vec<Implication>,
}

impl Default for VersionResolver {
    /// The resolver for Nuxt projects: Nuxt distribution aliases and the Vue
    /// version each Nuxt major bundles.
    fn default() -> Self {
        let mut resolver = Self::empty();
        for alias in ["nuxt-edge", "@nuxt/core", "nuxt3", "nuxt3-edge"] {
            resolver.alias(alias, "nuxt");
        }
        resolver.alias("vue-edge", "vue");
        resolver.imply(requirement("nuxt", "^2"), "vue", Version::new(2, 6, 0));
        resolver.imply(requirement("nuxt", "^3"), "vue", Version::new(3, 0, 0));
        resolver
    }
}

fn requirement(name: &str, range: &str) -> ModuleRequirement {
    ModuleRequirement {
        name: name.to_string(),
        version: semver::VersionReq::parse(range).ok(),
    }
}

impl VersionResolver {
    /// A resolver with no aliases or implications.
    pub fn empty() -> Self {
        Self {
            aliases: BTreeMap::new(),
            implications: Vec::new(),
        }
    }

    /// Treat `package` as the module `module`.
    pub fn alias(&mut self, package: impl Into<String>, module: impl Into<String>) {
        self.aliases.insert(package.into(), module.into());
    }

    /// Activate `module` at `version` whenever `when` holds and the project
    /// does not declare `module` itself.
    pub fn imply(&mut self, when: ModuleRequirement, module: impl Into<String>, version: Version) {
        self.implications.push(Implication {
            when,
            module: module.into(),
            version,
        });
    }

    /// The module id a package is known as.
    pub fn module_id<'a>(&'a self, package: &'a str) -> &'a str {
        self.aliases.get(package).map_or(package, String::as_str)
    }

    /// Compute the active modules for `dependencies`. Never fails: versions
    /// that do not parse leave the module active with an unknown version.
    pub fn resolve(&self, dependencies: &ProjectDependencies) -> VersionContext {
        let mut context = VersionContext::new();

        for (package, range) in dependencies.iter() {
            let module = self.module_id(package);
            let version = parse_version_lenient(range);
            if version.is_none() {
                debug!(package, range, "version not understood, keeping module without version");
            }
            let merged = match (context.get(module).cloned().flatten(), version) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
            context.insert(module, merged);
        }

        for implication in &self.implications {
            if !context.contains(&implication.module) && implication.when.is_satisfied_by(&context) {
                debug!(
                    module = %implication.module,
                    version = %implication.version,
                    because = %implication.when,
                    "implied module"
                );
                context.insert(implication.module.clone(), Some(implication.version.clone()));
            }
        }

        context
    }
}

/// Read a concrete version out of a dependency range such as `^2.8.1`,
/// `~2.8`, `v2` or `2.x`, taking the lowest version the range names.
///
/// Returns `None` for tags (`latest`), wildcards, URLs and workspace
/// references.
pub fn parse_version_lenient(range: &str) -> Option<Version> {
    let first = range.split("||").next()?.split_whitespace().next()?;
    let cleaned = first.trim_start_matches(['^', '~', '=', '>', '<', 'v', 'V']);
    if let Ok(version) = Version::parse(cleaned) {
        return Some(version);
    }

    let core = cleaned.split(['-', '+']).next()?;
    let mut parts = [0u64; 3];
    let mut seen = 0;
    for (i, part) in core.split('.').enumerate() {
        if i >= parts.len() {
            return None;
        }
        if matches!(part, "x" | "X" | "*") {
            break;
        }
        parts[i] = part.parse().ok()?;
        seen += 1;
    }
    if seen == 0 {
        return None;
    }
    Some(Version::new(parts[0], parts[1], parts[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn lenient_versions() {
        assert_eq!(parse_version_lenient("2.8.1"), Some(v("2.8.1")));
        assert_eq!(parse_version_lenient("^2.8.1"), Some(v("2.8.1")));
        assert_eq!(parse_version_lenient("~2.8"), Some(v("2.8.0")));
        assert_eq!(parse_version_lenient("v2"), Some(v("2.0.0")));
        assert_eq!(parse_version_lenient("2.x"), Some(v("2.0.0")));
        assert_eq!(parse_version_lenient(">=2.13.0 <3"), Some(v("2.13.0")));
        assert_eq!(parse_version_lenient("^2.0.0 || ^3.0.0"), Some(v("2.0.0")));
        assert_eq!(parse_version_lenient("3.0.0-rc.1"), Some(v("3.0.0-rc.1")));
        assert_eq!(parse_version_lenient("latest"), None);
        assert_eq!(parse_version_lenient("*"), None);
        assert_eq!(parse_version_lenient("workspace:*"), None);
        assert_eq!(parse_version_lenient(""), None);
    }

    #[test]
    fn nuxt_2_implies_vue_2() {
        let deps = ProjectDependencies::new().with("nuxt", "^2.8.1");
        let context = VersionResolver::default().resolve(&deps);
        assert_eq!(context.version("nuxt"), Some(&v("2.8.1")));
        assert_eq!(context.version("vue"), Some(&v("2.6.0")));
    }

    #[test]
    fn package_specs() {
        let mut deps = ProjectDependencies::new();
        deps.add_spec("nuxt@2.8.1");
        deps.add_spec("@nuxt/core@^2.15");
        deps.add_spec("vue");
        assert_eq!(
            deps.iter().collect::<Vec<_>>(),
            vec![("nuxt", "2.8.1"), ("@nuxt/core", "^2.15"), ("vue", "*")]
        );
        let context = VersionResolver::default().resolve(&deps);
        assert_eq!(context.version("nuxt"), Some(&v("2.15.0")));
        assert!(context.contains("vue"));
        assert_eq!(context.version("vue"), None);
    }

    #[test]
    fn nuxt_3_implies_vue_3() {
        let deps = ProjectDependencies::new().with("nuxt3", "3.0.0");
        let context = VersionResolver::default().resolve(&deps);
        assert_eq!(context.version("nuxt"), Some(&v("3.0.0")));
        assert_eq!(context.version("vue"), Some(&v("3.0.0")));
    }

    #[test]
    fn declared_module_wins_over_implied() {
        let deps: ProjectDependencies = [("vue", "2.6.10"), ("nuxt", "2.8.1")].into_iter().collect();
        let context = VersionResolver::default().resolve(&deps);
        assert_eq!(context.version("vue"), Some(&v("2.6.10")));
    }

    #[test]
    fn unknown_version_keeps_module() {
        let deps = ProjectDependencies::new().with("nuxt", "latest");
        let context = VersionResolver::default().resolve(&deps);
        assert!(context.contains("nuxt"));
        assert_eq!(context.version("nuxt"), None);
        // A ranged implication needs a known version.
        assert!(!context.contains("vue"));
    }

    #[test]
    fn aliases_merge_to_highest_version() {
        let deps = ProjectDependencies::new()
            .with("nuxt", "2.8.1")
            .with("nuxt-edge", "2.16.0");
        let context = VersionResolver::default().resolve(&deps);
        assert_eq!(context.version("nuxt"), Some(&v("2.16.0")));
        assert!(!context.contains("nuxt-edge"));
    }

    #[test]
    fn empty_dependencies_give_empty_context() {
        let context = VersionResolver::default().resolve(&ProjectDependencies::new());
        assert!(context.is_empty());
    }

    #[test]
    fn package_json_sections() {
        let deps = ProjectDependencies::from_package_json(
            r#"{
                "name": "app",
                "dependencies": { "nuxt": "^2.8.1" },
                "devDependencies": { "@nuxtjs/eslint-module": "^1.0.0" },
                "scripts": { "dev": "nuxt" }
            }"#,
        )
        .unwrap();
        let packages: Vec<_> = deps.iter().map(|(p, _)| p).collect();
        assert_eq!(packages, vec!["nuxt", "@nuxtjs/eslint-module"]);

        assert!(ProjectDependencies::from_package_json("{").is_err());
        assert!(ProjectDependencies::from_package_json("{}").unwrap().is_empty());
    }
}
