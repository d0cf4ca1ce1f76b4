use jsconf_schema::{SchemaNotFound, SchemaRegistry, VersionContext};
use jsconf_tree::Document;
use tracing::debug;

use crate::collector::{CompletionCandidate, collect};
use crate::error::CompletionError;
use crate::locator::{CursorSite, Location, locate};
use crate::matcher::match_path;

/// The answer to one completion request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completions {
    /// Candidates in display order.
    pub candidates: Vec<CompletionCandidate>,
    /// Where the cursor was found, when it was inside the configuration
    /// object.
    pub location: Option<Location>,
}

impl Completions {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Display forms of the candidates, in order.
    pub fn displays(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.display.as_str())
    }
}

/// Runs locate, match and collect against the schemas of a registry.
#[derive(Debug, Clone, Copy)]
pub struct CompletionEngine<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> CompletionEngine<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    /// Complete at `offset` in an already parsed document.
    ///
    /// Only an unknown `kind` is an error. A cursor outside the
    /// configuration object, on a path the schema does not describe or
    /// disables, or in a value position yields empty completions.
    pub fn complete(
        &self,
        kind: &str,
        document: &Document,
        offset: u32,
        context: &VersionContext,
    ) -> Result<Completions, SchemaNotFound> {
        let root = self.registry.get_root_schema(kind)?;

        let location = match locate(document, offset) {
            Ok(location) => location,
            Err(error) => {
                debug!(kind, offset, %error, "no completions");
                return Ok(Completions::default());
            }
        };

        match candidates_at(root, &location, context) {
            Ok(candidates) => {
                debug!(
                    kind,
                    offset,
                    chain = %location.chain,
                    count = candidates.len(),
                    "completed"
                );
                Ok(Completions {
                    candidates,
                    location: Some(location),
                })
            }
            Err(error) => {
                debug!(kind, offset, chain = %location.chain, %error, "no completions");
                Ok(Completions {
                    candidates: Vec::new(),
                    location: Some(location),
                })
            }
        }
    }

    /// Parse `source` and complete at `offset`.
    pub fn complete_source(
        &self,
        kind: &str,
        source: &str,
        offset: u32,
        context: &VersionContext,
    ) -> Result<Completions, SchemaNotFound> {
        self.complete(kind, &Document::parse(source), offset, context)
    }
}

impl CompletionEngine<'static> {
    /// An engine over [`SchemaRegistry::builtin`].
    pub fn builtin() -> Self {
        Self::new(SchemaRegistry::builtin())
    }
}

fn candidates_at(
    root: &jsconf_schema::SchemaNode,
    location: &Location,
    context: &VersionContext,
) -> Result<Vec<CompletionCandidate>, CompletionError> {
    if location.site == CursorSite::Value {
        return Err(CompletionError::ValuePosition);
    }
    let matched = match_path(root, &location.chain)?;
    if !matched.is_available(context) {
        return Err(CompletionError::NoSuchSchemaPath {
            path: location.chain.to_string(),
        });
    }
    collect(matched.node, context, &location.siblings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsconf_schema::{NUXT_CONFIG, Version};
    use jsconf_testhelpers::extract_caret;

    fn nuxt(version: Version) -> VersionContext {
        VersionContext::new().with("nuxt", Some(version))
    }

    fn complete(marked: &str, context: &VersionContext) -> Completions {
        let (source, offset) = extract_caret(marked);
        CompletionEngine::builtin()
            .complete_source(NUXT_CONFIG, &source, offset, context)
            .unwrap()
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let err = CompletionEngine::builtin()
            .complete_source("webpack-config", "module.exports = {}", 19, &VersionContext::new())
            .unwrap_err();
        assert_eq!(err.kind, "webpack-config");
    }

    #[test]
    fn outside_gives_nothing() {
        let completions = complete("<caret>export default {}", &VersionContext::new());
        assert!(completions.is_empty());
        assert!(completions.location.is_none());
    }

    #[test]
    fn value_position_gives_nothing() {
        let completions = complete("export default { mode: 'sp<caret>' }", &VersionContext::new());
        assert!(completions.is_empty());
        assert_eq!(completions.location.unwrap().site, CursorSite::Value);
    }

    #[test]
    fn leaf_and_array_give_nothing() {
        let context = VersionContext::new();
        assert!(complete("export default { css: [<caret>] }", &context).is_empty());
        assert!(complete("export default { env: { API: { <caret> } } }", &context).is_empty());
        assert!(complete("export default { dev: { <caret> } }", &context).is_empty());
    }

    #[test]
    fn gated_parents_hide_their_children() {
        let marked = r#"export default { "vue.config": { <caret> } }"#;
        assert!(complete(marked, &nuxt(Version::new(2, 8, 1))).is_empty());
        let with_vue = nuxt(Version::new(2, 8, 1)).with("vue", Some(Version::new(2, 6, 10)));
        assert_eq!(
            complete(marked, &with_vue).displays().collect::<Vec<_>>(),
            vec!["devtools", "performance", "productionTip", "silent"]
        );
    }

    #[test]
    fn computed_and_spread_literals_give_nothing() {
        let context = nuxt(Version::new(2, 8, 1)).with("vue", Some(Version::new(2, 6, 10)));
        let completions = complete("export default { ['x']: { <caret> } }", &context);
        assert!(completions.is_empty());
        assert!(completions.location.is_none());
        assert!(complete("export default { ...{ <caret> } }", &context).is_empty());
    }

    #[test]
    fn method_bodies_give_nothing() {
        let context = nuxt(Version::new(2, 8, 1));
        let completions = complete("export default { build() { <caret> } }", &context);
        assert!(completions.is_empty());
        assert_eq!(completions.location.unwrap().site, CursorSite::Value);
    }

    #[test]
    fn detail_is_the_description() {
        let completions = complete("export default { <caret> }", &VersionContext::new());
        let dev = completions.candidates.iter().find(|c| c.name == "dev").unwrap();
        assert!(dev.detail.is_some());
    }
}
