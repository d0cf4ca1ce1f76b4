//! Helpers shared by the jsconf test suites.
//!
//! Two notations are supported:
//!
//! - A `<caret>` marker inside a source string marks the cursor offset:
//!
//!   ```text
//!   export default { bu<caret> }
//!   ```
//!
//! - Error annotations: a line made of spaces and `^` followed by an error
//!   name annotates the source line above it.
//!
//!   ```text
//!   { a: 1 b: 2 }
//!         ^ MissingComma
//!   ```

use std::ops::Range;
use std::sync::Once;

/// The cursor marker understood by [`extract_caret`].
pub const CARET: &str = "<caret>";

/// Remove the single `<caret>` marker from `marked`, returning the clean
/// source and the cursor offset.
///
/// # Panics
///
/// Panics if the marker is missing or appears more than once.
pub fn extract_caret(marked: &str) -> (String, u32) {
    let offset = marked
        .find(CARET)
        .unwrap_or_else(|| panic!("no {CARET} marker in source:\n{marked}"));
    let rest = &marked[offset + CARET.len()..];
    assert!(
        !rest.contains(CARET),
        "more than one {CARET} marker in source:\n{marked}"
    );
    let mut source = String::with_capacity(marked.len() - CARET.len());
    source.push_str(&marked[..offset]);
    source.push_str(rest);
    (source, offset as u32)
}

/// An error produced by the code under test, in a form comparable with
/// annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualError {
    /// Byte range in the source without annotations.
    pub span: Range<usize>,
    /// Error name as written in annotations, e.g. `MissingComma`.
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ExpectedError {
    span: Range<usize>,
    kind: String,
}

fn parse_annotation(line: &str) -> Option<(usize, usize, String)> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('^') {
        return None;
    }
    let column = line.len() - trimmed.len();
    let carets = trimmed.chars().take_while(|c| *c == '^').count();
    let kind = trimmed[carets..].trim();
    if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((column, carets, kind.to_string()))
}

fn split_annotations(annotated: &str) -> (String, Vec<ExpectedError>) {
    let mut source = String::with_capacity(annotated.len());
    let mut expected = Vec::new();
    let mut last_line_start = 0;

    for line in annotated.split_inclusive('\n') {
        if let Some((column, carets, kind)) = parse_annotation(line.trim_end_matches('\n')) {
            let start = last_line_start + column;
            expected.push(ExpectedError {
                span: start..start + carets,
                kind,
            });
            continue;
        }
        last_line_start = source.len();
        source.push_str(line);
    }

    (source, expected)
}

/// The annotated source with every annotation line removed.
pub fn source_without_annotations(annotated: &str) -> String {
    split_annotations(annotated).0
}

/// Assert that `actual` matches the annotations in `annotated` exactly.
///
/// A single `^` also matches an empty span at that column, so zero-width
/// errors such as a missing comma can be annotated.
///
/// # Panics
///
/// Panics with a report of missing and unexpected errors on mismatch.
pub fn assert_annotated_errors(annotated: &str, actual: Vec<ActualError>) {
    let (source, expected) = split_annotations(annotated);

    let matches = |e: &ExpectedError, a: &ActualError| {
        e.kind == a.kind
            && e.span.start == a.span.start
            && (e.span.end == a.span.end || (e.span.len() == 1 && a.span.is_empty()))
    };

    let missing: Vec<_> = expected
        .iter()
        .filter(|e| !actual.iter().any(|a| matches(e, a)))
        .collect();
    let unexpected: Vec<_> = actual
        .iter()
        .filter(|a| !expected.iter().any(|e| matches(e, a)))
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        return;
    }

    let mut report = format!("error annotations do not match\n\nsource:\n{source}\n");
    for e in &missing {
        let text = source.get(e.span.clone()).unwrap_or("");
        report.push_str(&format!(
            "  missing:    {} at {:?} ({text:?})\n",
            e.kind, e.span
        ));
    }
    for a in &unexpected {
        let text = source.get(a.span.clone()).unwrap_or("");
        report.push_str(&format!(
            "  unexpected: {} at {:?} ({text:?})\n",
            a.kind, a.span
        ));
    }
    panic!("{report}");
}

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; output goes through the test writer so it is only
/// shown for failing tests.
pub fn setup_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
    tracing::trace!("tracing initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_is_removed() {
        let (source, offset) = extract_caret("{ bu<caret> }");
        assert_eq!(source, "{ bu }");
        assert_eq!(offset, 4);
    }

    #[test]
    #[should_panic(expected = "no <caret> marker")]
    fn caret_is_required() {
        extract_caret("{ }");
    }

    #[test]
    fn annotations_are_stripped() {
        let annotated = "\n{ a: 1 b: 2 }\n      ^ MissingComma\nnext\n";
        assert_eq!(source_without_annotations(annotated), "\n{ a: 1 b: 2 }\nnext\n");
    }

    #[test]
    fn empty_span_matches_single_caret() {
        assert_annotated_errors(
            "\n{ a: 1 b: 2 }\n      ^ MissingComma\n",
            vec![ActualError {
                span: 7..7,
                kind: "MissingComma".into(),
            }],
        );
    }

    #[test]
    #[should_panic(expected = "unexpected: ExpectedKey")]
    fn reports_unexpected_errors() {
        assert_annotated_errors(
            "\n{ : }\n",
            vec![ActualError {
                span: 3..4,
                kind: "ExpectedKey".into(),
            }],
        );
    }
}
