use super::*;
use crate::{ParseErrorKind, ScalarKind};
use jsconf_testhelpers::{ActualError, assert_annotated_errors, source_without_annotations};

fn parse(source: &str) -> Vec<Event<'_>> {
    jsconf_testhelpers::setup_tracing();
    Parser::new(source).parse_to_vec()
}

fn error_kind_name(kind: &ParseErrorKind) -> &'static str {
    match kind {
        ParseErrorKind::UnexpectedToken => "UnexpectedToken",
        ParseErrorKind::InvalidToken => "InvalidToken",
        ParseErrorKind::UnclosedObject => "UnclosedObject",
        ParseErrorKind::UnclosedArray => "UnclosedArray",
        ParseErrorKind::UnclosedCall => "UnclosedCall",
        ParseErrorKind::ExpectedKey => "ExpectedKey",
        ParseErrorKind::ExpectedValue => "ExpectedValue",
        ParseErrorKind::MissingComma => "MissingComma",
    }
}

fn assert_parse_errors(annotated_source: &str) {
    let source = source_without_annotations(annotated_source);
    let events = parse(&source);
    let actual_errors: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Error { span, kind } => Some(ActualError {
                span: (*span).into(),
                kind: error_kind_name(kind).to_string(),
            }),
            _ => None,
        })
        .collect();
    assert_annotated_errors(annotated_source, actual_errors);
}

fn keys<'a>(events: &'a [Event<'_>]) -> Vec<&'a str> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Key { name: Some(n), .. } => Some(n.as_ref()),
            _ => None,
        })
        .collect()
}

fn targets<'src>(events: &[Event<'src>]) -> Vec<BindingTarget<'src>> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::BindingStart { target, .. } => Some(*target),
            _ => None,
        })
        .collect()
}

fn errors(events: &[Event<'_>]) -> Vec<ParseErrorKind> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Error { kind, .. } => Some(kind.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn empty_document() {
    let events = parse("");
    assert_eq!(events, vec![Event::DocumentStart, Event::DocumentEnd { len: 0 }]);
}

#[test]
fn export_default_object() {
    let events = parse("export default { build: {}, dev: true }");
    assert_eq!(targets(&events), vec![BindingTarget::ExportDefault]);
    assert_eq!(keys(&events), vec!["build", "dev"]);
    assert!(errors(&events).is_empty());
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Scalar { value, kind: ScalarKind::Literal, .. } if value == "true"
    )));
}

#[test]
fn module_exports_and_typescript_assignment() {
    let events = parse("module.exports = { a: 1 }");
    assert_eq!(targets(&events), vec![BindingTarget::ModuleExports]);

    let events = parse("export = { a: 1 }");
    assert_eq!(targets(&events), vec![BindingTarget::ExportAssignment]);
}

#[test]
fn variable_declarations() {
    let events = parse(
        "import { defineNuxtConfig } from 'nuxt'\n\
         const config: NuxtConfig = { head: {} }\n\
         export default config\n",
    );
    assert_eq!(
        targets(&events),
        vec![BindingTarget::Variable("config"), BindingTarget::ExportDefault]
    );
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Scalar { value, kind: ScalarKind::Identifier, .. } if value == "config"
    )));
}

#[test]
fn wrapper_call_arguments_are_parsed() {
    let events = parse("export default defineNuxtConfig({ ssr: false })");
    assert!(events.iter().any(|e| matches!(
        e,
        Event::CallStart { callee: "defineNuxtConfig", .. }
    )));
    assert_eq!(keys(&events), vec!["ssr"]);
    assert!(errors(&events).is_empty());
}

#[test]
fn quoted_and_numeric_keys() {
    let events = parse(r#"export default { "vue.config": {}, 'http-equiv': 1, 0: 2 }"#);
    assert_eq!(keys(&events), vec!["vue.config", "http-equiv", "0"]);
    let kinds: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Key { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![KeyKind::String, KeyKind::String, KeyKind::Number]);
}

#[test]
fn computed_keys_have_no_name() {
    let events = parse("export default { [key]: 1, b: 2 }");
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Key { name: None, kind: KeyKind::Computed, span } if *span == Span::new(17, 22)
    )));
    assert_eq!(keys(&events), vec!["b"]);
}

#[test]
fn shorthand_methods_and_spreads() {
    let events = parse(
        "export default {\n  build,\n  extend(config, ctx) { return config },\n  ...base,\n  async hook() {},\n}",
    );
    assert_eq!(keys(&events), vec!["build", "extend", "hook"]);
    assert!(events.iter().any(|e| matches!(e, Event::Spread { .. })));
    assert!(errors(&events).is_empty(), "{:?}", errors(&events));
}

#[test]
fn opaque_values_are_skipped() {
    let events = parse(
        "export default {\n  a: process.env.PORT || 3000,\n  b: () => ({ x: 1 }),\n  c: dev ? 'x' : 'y',\n  d: function () { return 1 },\n  e: 1\n}",
    );
    assert_eq!(keys(&events), vec!["a", "b", "c", "d", "e"]);
    let exprs = events
        .iter()
        .filter(|e| matches!(e, Event::Expr { .. }))
        .count();
    assert_eq!(exprs, 4);
    assert!(errors(&events).is_empty(), "{:?}", errors(&events));
}

#[test]
fn literal_followed_by_type_assertion_keeps_the_literal() {
    let events = parse("export default { a: 1 } as Config");
    assert_eq!(keys(&events), vec!["a"]);
    assert!(!events.iter().any(|e| matches!(e, Event::Expr { .. })));
}

#[test]
fn regex_values() {
    let events = parse("export default { ignore: /\\.spec\\.js$/, b: 1 }");
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Scalar { kind: ScalarKind::Regex, .. }
    )));
    assert_eq!(keys(&events), vec!["ignore", "b"]);
}

#[test]
fn missing_value_spans_the_gap() {
    let events = parse("export default { a: }");
    assert!(events.contains(&Event::Missing {
        span: Span::new(19, 20)
    }));
}

#[test]
fn unclosed_object_ends_at_eof() {
    let source = "export default { head: { ";
    let events = parse(source);
    let ends: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::ObjectEnd { span, closed } => Some((*span, *closed)),
            _ => None,
        })
        .collect();
    let eof = Span::empty(source.len() as u32);
    assert_eq!(ends, vec![(eof, false), (eof, false)]);
}

#[test]
fn partial_key_is_a_shorthand_entry() {
    let events = parse("export default {\n  bu\n  build: {}\n}");
    assert_eq!(keys(&events), vec!["bu", "build"]);
}

#[test]
fn callback_can_stop_early() {
    struct FirstKey(Option<String>);
    impl<'src> ParseCallback<'src> for FirstKey {
        fn event(&mut self, event: Event<'src>) -> bool {
            if let Event::Key { name: Some(n), .. } = event {
                self.0 = Some(n.into_owned());
                return false;
            }
            true
        }
    }

    let mut cb = FirstKey(None);
    Parser::new("export default { a: 1, b: 2 }").parse(&mut cb);
    assert_eq!(cb.0.as_deref(), Some("a"));
}

#[test]
fn error_missing_comma() {
    assert_parse_errors(
        r#"
export default { a: 1 b: 2 }
                     ^ MissingComma
"#,
    );
}

#[test]
fn error_expected_key() {
    assert_parse_errors(
        r#"
export default { : 1 }
                 ^ ExpectedKey
"#,
    );
}

#[test]
fn error_expected_value() {
    assert_parse_errors(
        r#"
export default { a: }
                    ^ ExpectedValue
"#,
    );
}

#[test]
fn error_unclosed_object() {
    assert_parse_errors(
        r#"
export default { a: {
                    ^ UnclosedObject
               ^ UnclosedObject
"#,
    );
}

#[test]
fn error_unclosed_array_and_call() {
    assert_parse_errors(
        r#"
export default defineConfig({ a: [1, 2
                                 ^ UnclosedArray
                            ^ UnclosedObject
                           ^ UnclosedCall
"#,
    );
}

#[test]
fn error_invalid_token() {
    assert_parse_errors(
        r#"
export default { a: 'open
                    ^^^^^ InvalidToken
               ^ UnclosedObject
"#,
    );
}
