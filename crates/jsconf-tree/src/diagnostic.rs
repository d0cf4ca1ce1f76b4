//! Diagnostic rendering for parser errors.

use ariadne::{Color, Label, Report, ReportKind, Source};
use jsconf_parse::{ParseErrorKind, Span};

/// A parser error with source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// Source location.
    pub span: Span,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Render this error with ariadne.
    ///
    /// Returns a string containing the formatted error message with source context.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let report = self.build_report(filename);
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
    ) -> ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)> {
        let range = self.span.start as usize..self.span.end as usize;
        let report = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(self.message());

        let label = |message: &str| {
            Label::new((filename, range.clone()))
                .with_message(message)
                .with_color(Color::Red)
        };

        match self.kind {
            ParseErrorKind::UnclosedObject => report
                .with_label(label("object opened here"))
                .with_help("add a closing '}'"),
            ParseErrorKind::UnclosedArray => report
                .with_label(label("array opened here"))
                .with_help("add a closing ']'"),
            ParseErrorKind::UnclosedCall => report
                .with_label(label("arguments opened here"))
                .with_help("add a closing ')'"),
            ParseErrorKind::MissingComma => report
                .with_label(label("expected ','"))
                .with_help("separate entries with commas"),
            ParseErrorKind::UnexpectedToken => report.with_label(label("unexpected")),
            ParseErrorKind::InvalidToken => report
                .with_label(label("cannot be read"))
                .with_help("check for an unterminated string, template or comment"),
            ParseErrorKind::ExpectedKey => report
                .with_label(label("expected a key here"))
                .with_help("keys are identifiers, quoted strings, numbers or `[computed]`"),
            ParseErrorKind::ExpectedValue => report.with_label(label("expected a value here")),
        }
    }

    /// One-line description of the error.
    pub fn message(&self) -> &'static str {
        match self.kind {
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::InvalidToken => "invalid token",
            ParseErrorKind::UnclosedObject => "unclosed object",
            ParseErrorKind::UnclosedArray => "unclosed array",
            ParseErrorKind::UnclosedCall => "unclosed call arguments",
            ParseErrorKind::ExpectedKey => "expected key",
            ParseErrorKind::ExpectedValue => "expected value",
            ParseErrorKind::MissingComma => "missing comma",
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at offset {}", self.message(), self.span.start)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    macro_rules! assert_snapshot_stripped {
        ($value:expr, @$snapshot:literal) => {{
            let stripped = String::from_utf8(strip_ansi_escapes::strip(&$value)).unwrap();
            insta::assert_snapshot!(stripped, @$snapshot);
        }};
    }

    #[test]
    fn display_includes_offset() {
        let doc = Document::parse("export default { a: }");
        assert_eq!(doc.errors.len(), 1);
        assert_eq!(doc.errors[0].to_string(), "expected value at offset 20");
    }

    #[test]
    fn unclosed_object_diagnostic() {
        let source = "export default {\n  head: {}";
        let doc = Document::parse(source);
        assert_eq!(doc.errors.len(), 1);

        let rendered = doc.errors[0].render("nuxt.config.js", source);
        let stripped = String::from_utf8(strip_ansi_escapes::strip(&rendered)).unwrap();
        assert!(stripped.contains("unclosed object"), "{stripped}");
        assert!(stripped.contains("object opened here"), "{stripped}");
        assert!(stripped.contains("add a closing '}'"), "{stripped}");
        assert!(stripped.contains("nuxt.config.js"), "{stripped}");
    }

    #[test]
    fn missing_comma_diagnostic() {
        let source = "export default { a: 1 b: 2 }";
        let doc = Document::parse(source);
        assert_eq!(doc.errors.len(), 1);
        assert_snapshot_stripped!(doc.errors[0].to_string(), @"missing comma at offset 21");
    }
}
