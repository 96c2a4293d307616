//! Per-parse mutable state
//!
//! One [`ParseContext`] lives for exactly one parse call. It owns the active
//! delimiters (which an interchange may override), the running segment
//! number used in diagnostics, and the namespace scope stack that decides
//! where namespace declarations are emitted.

use smol_str::SmolStr;

use super::events::{Attribute, Element, EventSink};
use crate::base::{Delimiters, Position};

/// A namespace in scope, with the prefix used for qualified names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceBinding {
    pub uri: String,
    pub prefix: Option<SmolStr>,
}

/// An element opened through the context, to be closed with [`ParseContext::close`].
#[derive(Debug)]
pub struct OpenElement {
    pub element: Element,
    /// True if opening the element pushed a namespace scope.
    scoped: bool,
}

#[derive(Debug, Clone)]
pub struct ParseContext {
    pub delimiters: Delimiters,
    segment_number: usize,
    namespaces: Vec<NamespaceBinding>,
    depth: usize,
}

impl ParseContext {
    pub fn new(delimiters: Delimiters) -> Self {
        Self {
            delimiters,
            segment_number: 0,
            namespaces: Vec::new(),
            depth: 0,
        }
    }

    /// Number of the last segment read (1-based).
    pub fn segment_number(&self) -> usize {
        self.segment_number
    }

    /// Count one more segment read from the input.
    pub fn advance_segment(&mut self) -> usize {
        self.segment_number += 1;
        self.segment_number
    }

    /// Position of the last segment read.
    pub fn position(&self) -> Position {
        Position::segment(self.segment_number)
    }

    /// Position of the segment about to be read.
    pub fn next_position(&self) -> Position {
        Position::segment(self.segment_number + 1)
    }

    /// Current element nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The innermost namespace binding.
    pub fn namespace(&self) -> Option<&NamespaceBinding> {
        self.namespaces.last()
    }

    /// Build an element in the current namespace.
    pub fn element(&self, local_name: &str) -> Element {
        match self.namespace() {
            Some(binding) => Element::new(&binding.uri, binding.prefix.as_deref(), local_name),
            None => Element::new("", None, local_name),
        }
    }

    /// Open an element that starts a namespace scope.
    ///
    /// A declaration attribute is attached only when `uri` differs from the
    /// nearest enclosing scope.
    pub fn open_scope<S: EventSink>(
        &mut self,
        sink: &mut S,
        local_name: &str,
        uri: &str,
        prefix: Option<&str>,
    ) -> OpenElement {
        let redeclare = self.namespace().is_none_or(|b| b.uri != uri);
        self.namespaces.push(NamespaceBinding {
            uri: uri.to_string(),
            prefix: prefix.map(SmolStr::new),
        });
        let mut element = self.element(local_name);
        if redeclare {
            element
                .attributes
                .push(Attribute::namespace_declaration(prefix, uri));
        }
        self.depth += 1;
        sink.enter_element(&element);
        OpenElement {
            element,
            scoped: true,
        }
    }

    /// Open an element, starting a scope if `namespace` overrides the current one.
    pub fn open<S: EventSink>(
        &mut self,
        sink: &mut S,
        local_name: &str,
        namespace: Option<&str>,
    ) -> OpenElement {
        if let Some(uri) = namespace {
            if self.namespace().is_none_or(|b| b.uri != uri) {
                let prefix = self.namespace().and_then(|b| b.prefix.clone());
                return self.open_scope(sink, local_name, uri, prefix.as_deref());
            }
        }
        let element = self.element(local_name);
        self.depth += 1;
        sink.enter_element(&element);
        OpenElement {
            element,
            scoped: false,
        }
    }

    pub fn close<S: EventSink>(&mut self, sink: &mut S, open: OpenElement) {
        sink.leave_element(&open.element);
        self.depth = self.depth.saturating_sub(1);
        if open.scoped {
            self.namespaces.pop();
        }
    }

    /// Emit `<local_name>value</local_name>` in the current namespace.
    pub fn leaf<S: EventSink>(&mut self, sink: &mut S, local_name: &str, value: &str) {
        let open = self.open(sink, local_name, None);
        sink.text(value);
        self.close(sink, open);
    }
}
