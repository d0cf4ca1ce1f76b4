//! Tree builder from parse events.

use jsconf_parse::{BindingTarget, Event, ParseCallback, Span};
use tracing::trace;

use crate::Document;
use crate::diagnostic::ParseError;
use crate::value::{Array, Binding, BindingKind, Call, Entry, Key, Object, Scalar, Value};

/// Builder that constructs a [`Document`] from parse events.
///
/// The parser closes every structure it opens, even on malformed input, so
/// the builder never fails. Frames still open when [`finish`] is called
/// (because event delivery was stopped early) are closed at end of input.
///
/// [`finish`]: TreeBuilder::finish
pub struct TreeBuilder {
    stack: Vec<BuilderFrame>,
    bindings: Vec<Binding>,
    errors: Vec<ParseError>,
    len: u32,
}

enum BuilderFrame {
    Binding {
        kind: BindingKind,
        span: Span,
        value: Option<Value>,
    },
    Object {
        entries: Vec<Entry>,
        open: Span,
    },
    Array {
        items: Vec<Value>,
        open: Span,
    },
    Call {
        callee: String,
        callee_span: Span,
        args: Vec<Value>,
    },
    Entry {
        start: u32,
        key: Option<Key>,
        colon: Option<Span>,
        value: Option<Value>,
    },
}

impl TreeBuilder {
    /// Create a new tree builder.
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            bindings: Vec::new(),
            errors: Vec::new(),
            len: 0,
        }
    }

    /// Finish building and return the document.
    pub fn finish(mut self) -> Document {
        while !self.stack.is_empty() {
            let end = Span::empty(self.len);
            match self.stack.last() {
                Some(BuilderFrame::Object { .. }) => self.close_object(end, false),
                Some(BuilderFrame::Array { .. }) => self.close_array(end, false),
                Some(BuilderFrame::Call { .. }) => self.close_call(end, false),
                Some(BuilderFrame::Entry { .. }) => self.close_entry(self.len),
                Some(BuilderFrame::Binding { .. }) => self.close_binding(),
                None => break,
            }
        }
        Document {
            bindings: self.bindings,
            errors: self.errors,
            len: self.len,
        }
    }

    /// Push a value to the current context.
    fn push_value(&mut self, value: Value) {
        match self.stack.last_mut() {
            Some(BuilderFrame::Binding { value: slot, .. })
            | Some(BuilderFrame::Entry { value: slot, .. }) => *slot = Some(value),
            Some(BuilderFrame::Array { items, .. }) => items.push(value),
            Some(BuilderFrame::Call { args, .. }) => args.push(value),
            Some(BuilderFrame::Object { .. }) | None => {
                trace!(span = ?value.span(), "dropping value outside of an entry");
            }
        }
    }

    fn close_object(&mut self, end: Span, closed: bool) {
        if let Some(BuilderFrame::Object { entries, open }) = self.stack.pop() {
            self.push_value(Value::Object(Object {
                entries,
                span: Span::new(open.start, end.end.max(open.start)),
                closed,
            }));
        }
    }

    fn close_array(&mut self, end: Span, closed: bool) {
        if let Some(BuilderFrame::Array { items, open }) = self.stack.pop() {
            self.push_value(Value::Array(Array {
                items,
                span: Span::new(open.start, end.end.max(open.start)),
                closed,
            }));
        }
    }

    fn close_call(&mut self, end: Span, closed: bool) {
        if let Some(BuilderFrame::Call {
            callee,
            callee_span,
            args,
        }) = self.stack.pop()
        {
            self.push_value(Value::Call(Call {
                callee,
                args,
                span: Span::new(callee_span.start, end.end.max(callee_span.start)),
                closed,
            }));
        }
    }

    fn close_entry(&mut self, end: u32) {
        if let Some(BuilderFrame::Entry {
            start,
            key,
            colon,
            value,
        }) = self.stack.pop()
        {
            let end = value.as_ref().map_or(end, |v| end.max(v.span().end));
            let entry = Entry {
                key,
                colon,
                value,
                span: Span::new(start, end.max(start)),
            };
            if let Some(BuilderFrame::Object { entries, .. }) = self.stack.last_mut() {
                entries.push(entry);
            }
        }
    }

    fn close_binding(&mut self) {
        if let Some(BuilderFrame::Binding { kind, span, value }) = self.stack.pop() {
            let value = value.unwrap_or(Value::Missing(Span::empty(span.end)));
            self.bindings.push(Binding { kind, span, value });
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<'src> ParseCallback<'src> for TreeBuilder {
    fn event(&mut self, event: Event<'src>) -> bool {
        match event {
            Event::DocumentStart => {}
            Event::DocumentEnd { len } => self.len = len,

            Event::BindingStart { span, target } => {
                let kind = match target {
                    BindingTarget::ExportDefault => BindingKind::ExportDefault,
                    BindingTarget::ModuleExports => BindingKind::ModuleExports,
                    BindingTarget::ExportAssignment => BindingKind::ExportAssignment,
                    BindingTarget::Variable(name) => BindingKind::Variable(name.to_string()),
                };
                self.stack.push(BuilderFrame::Binding {
                    kind,
                    span,
                    value: None,
                });
            }
            Event::BindingEnd => self.close_binding(),

            Event::ObjectStart { span } => self.stack.push(BuilderFrame::Object {
                entries: Vec::new(),
                open: span,
            }),
            Event::ObjectEnd { span, closed } => self.close_object(span, closed),

            Event::ArrayStart { span } => self.stack.push(BuilderFrame::Array {
                items: Vec::new(),
                open: span,
            }),
            Event::ArrayEnd { span, closed } => self.close_array(span, closed),

            Event::CallStart { span, callee } => self.stack.push(BuilderFrame::Call {
                callee: callee.to_string(),
                callee_span: span,
                args: Vec::new(),
            }),
            Event::CallEnd { span, closed } => self.close_call(span, closed),

            Event::EntryStart { span } => self.stack.push(BuilderFrame::Entry {
                start: span.start,
                key: None,
                colon: None,
                value: None,
            }),
            Event::Key { span, name, kind } => {
                if let Some(BuilderFrame::Entry { key, .. }) = self.stack.last_mut() {
                    *key = Some(Key {
                        name: name.map(|n| n.into_owned()),
                        kind,
                        span,
                    });
                }
            }
            Event::Spread { .. } => {}
            Event::Colon { span } => {
                if let Some(BuilderFrame::Entry { colon, .. }) = self.stack.last_mut() {
                    *colon = Some(span);
                }
            }
            Event::EntryEnd { end } => self.close_entry(end),

            Event::Scalar { span, value, kind } => self.push_value(Value::Scalar(Scalar {
                text: value.into_owned(),
                kind,
                span,
            })),
            Event::Expr { span } => self.push_value(Value::Expr(span)),
            Event::Missing { span } => self.push_value(Value::Missing(span)),

            Event::Error { span, kind } => self.errors.push(ParseError::new(kind, span)),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsconf_parse::{KeyKind, Parser};

    fn build(source: &str) -> Document {
        let mut builder = TreeBuilder::new();
        Parser::new(source).parse(&mut builder);
        builder.finish()
    }

    #[test]
    fn entries_keep_their_spans() {
        let source = "export default { build: {}, dev }";
        let doc = build(source);
        let root = doc.bindings[0].value.as_object().unwrap();
        assert_eq!(root.span, Span::new(15, 33));
        assert!(root.closed);

        let build_entry = &root.entries[0];
        assert_eq!(build_entry.span.slice(source), "build: {}");
        assert_eq!(build_entry.colon, Some(Span::new(22, 23)));

        let dev = &root.entries[1];
        assert_eq!(dev.name(), Some("dev"));
        assert!(dev.value.is_none());
        assert_eq!(dev.key.as_ref().unwrap().kind, KeyKind::Identifier);
    }

    #[test]
    fn spread_entries_have_no_key() {
        let doc = build("export default { ...base, a: 1 }");
        let root = doc.bindings[0].value.as_object().unwrap();
        assert!(root.entries[0].is_spread());
        assert_eq!(root.entries[0].value.as_ref().and_then(Value::as_str), Some("base"));
        assert_eq!(root.keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn unclosed_structures_extend_to_end_of_input() {
        let source = "export default { head: { meta: [{ ";
        let doc = build(source);
        let root = doc.bindings[0].value.as_object().unwrap();
        assert!(!root.closed);
        assert_eq!(root.span.end as usize, source.len());
        let meta = doc.bindings[0].value.get("head.meta").unwrap();
        assert_eq!(meta.as_array().unwrap().items.len(), 1);
        assert_eq!(doc.errors.len(), 4);
    }

    #[test]
    fn stopped_event_stream_still_builds() {
        let mut builder = TreeBuilder::new();
        let events = Parser::new("export default { a: [1, 2").parse_to_vec();
        for event in events.into_iter().take(8) {
            builder.event(event);
        }
        let doc = builder.finish();
        assert_eq!(doc.bindings.len(), 1);
        assert!(doc.bindings[0].value.as_object().is_some());
    }
}
