//! Walking a schema along a key chain.

use jsconf_schema::{SchemaNode, Shape, VersionContext};

use crate::error::CompletionError;
use crate::locator::{KeyChain, Segment};

/// The schema node a key chain leads to.
#[derive(Debug, Clone)]
pub struct SchemaMatch<'s> {
    /// The node at the end of the chain.
    pub node: &'s SchemaNode,
    /// Every node passed through after the root, ending with `node`.
    pub trail: Vec<&'s SchemaNode>,
}

impl SchemaMatch<'_> {
    /// Whether every node on the way is available in `context`. A key
    /// nested under a gated property is gated too.
    pub fn is_available(&self, context: &VersionContext) -> bool {
        self.trail.iter().all(|node| node.is_available(context))
    }
}

/// Follow `chain` from `root`.
///
/// Keys are looked up exactly (case-sensitive) in object nodes; any index
/// resolves to an array node's element schema.
pub fn match_path<'s>(
    root: &'s SchemaNode,
    chain: &KeyChain,
) -> Result<SchemaMatch<'s>, CompletionError> {
    let mut node = root;
    let mut trail = Vec::with_capacity(chain.len());

    for (depth, segment) in chain.segments().iter().enumerate() {
        let next = match (segment, &node.shape) {
            (Segment::Key(name), Shape::Object(properties)) => properties.get(name),
            (Segment::Index(_), Shape::Array(element)) => Some(element.as_ref()),
            _ => None,
        };
        node = next.ok_or_else(|| CompletionError::NoSuchSchemaPath {
            path: chain.segments()[..=depth].iter().cloned().collect::<KeyChain>().to_string(),
        })?;
        trail.push(node);
    }

    Ok(SchemaMatch { node, trail })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsconf_schema::{ModuleRequirement, NodeKind, Version};

    fn schema() -> SchemaNode {
        let meta = SchemaNode::object([
            ("charset".to_string(), SchemaNode::leaf()),
            ("name".to_string(), SchemaNode::leaf()),
        ]);
        let head = SchemaNode::object([
            ("meta".to_string(), SchemaNode::array(meta)),
            ("title".to_string(), SchemaNode::leaf()),
        ]);
        let vue = SchemaNode::object([("devtools".to_string(), SchemaNode::leaf())])
            .requiring(ModuleRequirement::any("vue"));
        SchemaNode::object([("head".to_string(), head), ("vue.config".to_string(), vue)])
    }

    fn chain(segments: &[Segment]) -> KeyChain {
        segments.iter().cloned().collect()
    }

    fn key(name: &str) -> Segment {
        Segment::Key(name.to_string())
    }

    #[test]
    fn empty_chain_is_the_root() {
        let root = schema();
        let matched = match_path(&root, &KeyChain::new()).unwrap();
        assert!(std::ptr::eq(matched.node, &root));
        assert!(matched.trail.is_empty());
    }

    #[test]
    fn any_index_uses_the_element_schema() {
        let root = schema();
        for i in [0, 1, 7] {
            let matched =
                match_path(&root, &chain(&[key("head"), key("meta"), Segment::Index(i)])).unwrap();
            assert_eq!(matched.node.kind(), NodeKind::Object);
            assert!(matched.node.property("charset").is_some());
            assert_eq!(matched.trail.len(), 3);
        }
    }

    #[test]
    fn unknown_keys_fail() {
        let root = schema();
        let err = match_path(&root, &chain(&[key("head"), key("Meta")])).unwrap_err();
        assert_eq!(
            err,
            CompletionError::NoSuchSchemaPath {
                path: "head.Meta".into()
            }
        );
    }

    #[test]
    fn shape_mismatch_fails() {
        let root = schema();
        assert!(match_path(&root, &chain(&[Segment::Index(0)])).is_err());
        assert!(match_path(&root, &chain(&[key("head"), key("meta"), key("charset")])).is_err());
        assert!(match_path(&root, &chain(&[key("head"), key("title"), key("x")])).is_err());
    }

    #[test]
    fn gating_applies_along_the_trail() {
        let root = schema();
        let matched = match_path(&root, &chain(&[key("vue.config")])).unwrap();
        assert!(!matched.is_available(&VersionContext::new()));
        let context = VersionContext::new().with("vue", Some(Version::new(2, 6, 10)));
        assert!(matched.is_available(&context));
    }
}
