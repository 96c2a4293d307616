//! The event sink boundary
//!
//! The engine never builds a document tree. It reports structure to an
//! [`EventSink`] in document order: `begin`, then nested
//! `enter_element`/`text`/`leave_element` calls, then `end`. Tree builders,
//! serializers and test doubles all plug in here.

use smol_str::SmolStr;

/// An attribute of an element. The engine only emits namespace declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// `xmlns` or `xmlns:{prefix}`
    pub name: String,
    pub value: String,
}

impl Attribute {
    /// A declaration binding `prefix` (or the default namespace) to `uri`.
    pub fn namespace_declaration(prefix: Option<&str>, uri: &str) -> Self {
        let name = match prefix {
            Some(prefix) if !prefix.is_empty() => format!("xmlns:{prefix}"),
            _ => "xmlns".to_string(),
        };
        Self {
            name,
            value: uri.to_string(),
        }
    }
}

/// A structural element of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub namespace: String,
    pub local_name: SmolStr,
    /// `prefix:local` when the namespace is bound to a prefix.
    pub qualified_name: String,
    pub attributes: Vec<Attribute>,
}

impl Element {
    pub fn new(namespace: &str, prefix: Option<&str>, local_name: &str) -> Self {
        let qualified_name = match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local_name}"),
            _ => local_name.to_string(),
        };
        Self {
            namespace: namespace.to_string(),
            local_name: SmolStr::new(local_name),
            qualified_name,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Receives the decoded document structure.
pub trait EventSink {
    fn begin(&mut self) {}

    fn enter_element(&mut self, element: &Element);

    /// Text content of the innermost open element.
    fn text(&mut self, value: &str);

    fn leave_element(&mut self, element: &Element);

    fn end(&mut self) {}
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn begin(&mut self) {
        (**self).begin();
    }

    fn enter_element(&mut self, element: &Element) {
        (**self).enter_element(element);
    }

    fn text(&mut self, value: &str) {
        (**self).text(value);
    }

    fn leave_element(&mut self, element: &Element) {
        (**self).leave_element(element);
    }

    fn end(&mut self) {
        (**self).end();
    }
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Begin,
    Enter(Element),
    Text(String),
    Leave(SmolStr),
    End,
}

/// An [`EventSink`] that keeps every event, for tests and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRecorder {
    pub events: Vec<Event>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local names of entered elements, in order.
    pub fn element_names(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Enter(el) => Some(el.local_name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Text values, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The text of the first element named `local_name` that holds text directly.
    pub fn text_of(&self, local_name: &str) -> Option<&str> {
        self.events.windows(2).find_map(|pair| match pair {
            [Event::Enter(el), Event::Text(t)] if el.local_name.as_str() == local_name => Some(t.as_str()),
            _ => None,
        })
    }

    /// The first entered element named `local_name`.
    pub fn element(&self, local_name: &str) -> Option<&Element> {
        self.events.iter().find_map(|e| match e {
            Event::Enter(el) if el.local_name.as_str() == local_name => Some(el),
            _ => None,
        })
    }

    /// Render the stream as an indented outline, one element per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        let mut depth = 0usize;
        for event in &self.events {
            match event {
                Event::Enter(el) => {
                    out.push_str(&"  ".repeat(depth));
                    out.push_str(&el.qualified_name);
                    out.push('\n');
                    depth += 1;
                }
                Event::Text(t) => {
                    out.push_str(&"  ".repeat(depth));
                    out.push_str(&format!("= {t:?}\n"));
                }
                Event::Leave(_) => depth = depth.saturating_sub(1),
                Event::Begin | Event::End => {}
            }
        }
        out
    }
}

impl EventSink for EventRecorder {
    fn begin(&mut self) {
        self.events.push(Event::Begin);
    }

    fn enter_element(&mut self, element: &Element) {
        self.events.push(Event::Enter(element.clone()));
    }

    fn text(&mut self, value: &str) {
        self.events.push(Event::Text(value.to_string()));
    }

    fn leave_element(&mut self, element: &Element) {
        self.events.push(Event::Leave(element.local_name.clone()));
    }

    fn end(&mut self) {
        self.events.push(Event::End);
    }
}
