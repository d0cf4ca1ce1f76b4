//! Reasons a completion request yields nothing.

use jsconf_schema::NodeKind;

/// Why no candidates are available at a position.
///
/// None of these are failures from the user's point of view: the engine
/// logs them and answers with an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// The cursor is not inside an object or array literal reachable from
    /// the configuration root.
    NotInsideLiteral,
    /// The key chain leads somewhere the schema does not describe, or to a
    /// node whose modules are not active.
    NoSuchSchemaPath {
        /// The chain that failed, e.g. `head.metas`.
        path: String,
    },
    /// The schema node at the cursor has no keys to offer.
    NotCompletable {
        /// Kind of the matched node.
        kind: NodeKind,
    },
    /// The cursor is on a value, not where a key goes.
    ValuePosition,
}

impl std::fmt::Display for CompletionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionError::NotInsideLiteral => {
                write!(f, "cursor is not inside the configuration object")
            }
            CompletionError::NoSuchSchemaPath { path } => {
                write!(f, "no schema for `{path}`")
            }
            CompletionError::NotCompletable { kind } => {
                write!(f, "{kind} nodes have no keys to complete")
            }
            CompletionError::ValuePosition => write!(f, "cursor is in a value position"),
        }
    }
}

impl std::error::Error for CompletionError {}
