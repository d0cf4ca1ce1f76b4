//! Schema-driven property completion for configuration object literals.
//!
//! Given a parsed configuration file and a cursor offset, the pipeline
//! [locates](locate) the literal under the cursor, [matches](match_path)
//! its key chain against a schema and [collects](collect) the properties
//! that are valid there and not yet written. [`CompletionEngine`] runs all
//! three.
//!
//! ```
//! use jsconf_complete::CompletionEngine;
//! use jsconf_schema::{NUXT_CONFIG, Version, VersionContext};
//!
//! let context = VersionContext::new().with("nuxt", Some(Version::new(2, 8, 1)));
//! let source = "export default { head: { meta: [{ }] } }";
//! let completions = CompletionEngine::builtin()
//!     .complete_source(NUXT_CONFIG, source, 33, &context)
//!     .unwrap();
//! assert_eq!(completions.candidates[0].display, "\"http-equiv\"");
//! ```

mod collector;
mod engine;
mod error;
mod locator;
mod matcher;

pub use collector::{CompletionCandidate, collect, display_form, is_identifier};
pub use engine::{CompletionEngine, Completions};
pub use error::CompletionError;
pub use locator::{CursorSite, KeyChain, Location, Segment, locate};
pub use matcher::{SchemaMatch, match_path};

pub use jsconf_schema::{SchemaNotFound, VersionContext};
pub use jsconf_tree::Document;
