//! Value sources for the encoder
//!
//! The encoder walks the grammar and asks a [`ValueProvider`] for each node
//! in grammar order. [`ValueTree`] is the stock provider: it is built from a
//! parse's event stream by [`ValueTreeBuilder`] and hands out occurrences
//! sequentially, matched by element name within the current parent.

use smol_str::SmolStr;

use crate::model::MappingNode;
use crate::parser::events::{Element, EventSink};

/// Supplies values to the encoder.
pub trait ValueProvider {
    /// Step into the next occurrence of a structural node (group, segment
    /// or composite). Returns false when no occurrence is left.
    fn enter(&mut self, node: MappingNode<'_>) -> bool;

    /// Step out of the occurrence opened by the matching [`enter`](Self::enter).
    fn leave(&mut self, node: MappingNode<'_>);

    /// Take the next value of a leaf node, if any is left.
    fn lookup(&mut self, node: MappingNode<'_>) -> Option<String>;
}

// ============================================================================
// VALUE TREE
// ============================================================================

/// One element of a decoded document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueNode {
    pub name: SmolStr,
    pub text: Option<String>,
    pub children: Vec<ValueNode>,
}

impl ValueNode {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Leaf node holding `text`.
    pub fn leaf(name: impl Into<SmolStr>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, child: ValueNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first search for the first descendant named `name`.
    pub fn find(&self, name: &str) -> Option<&ValueNode> {
        self.children.iter().find_map(|child| {
            if child.name.as_str() == name {
                Some(child)
            } else {
                child.find(name)
            }
        })
    }

    /// A provider serving the children of this node.
    pub fn cursor(&self) -> ValueCursor<'_> {
        ValueCursor::new(self)
    }
}

/// A decoded document: an unnamed root whose children are the top-level elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueTree {
    pub root: ValueNode,
}

impl ValueTree {
    pub fn new(root: ValueNode) -> Self {
        Self { root }
    }

    /// Provider over the whole document.
    pub fn cursor(&self) -> ValueCursor<'_> {
        self.root.cursor()
    }

    pub fn find(&self, name: &str) -> Option<&ValueNode> {
        self.root.find(name)
    }
}

/// Builds a [`ValueTree`] from parse events.
#[derive(Debug)]
pub struct ValueTreeBuilder {
    stack: Vec<ValueNode>,
}

impl Default for ValueTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueTreeBuilder {
    pub fn new() -> Self {
        Self {
            stack: vec![ValueNode::default()],
        }
    }

    /// Finish building. Elements left open are closed.
    pub fn finish(mut self) -> ValueTree {
        while self.stack.len() > 1 {
            self.pop();
        }
        ValueTree::new(self.stack.pop().unwrap_or_default())
    }

    fn pop(&mut self) {
        if let Some(node) = self.stack.pop() {
            match self.stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => self.stack.push(node),
            }
        }
    }
}

impl EventSink for ValueTreeBuilder {
    fn begin(&mut self) {
        if self.stack.is_empty() {
            self.stack.push(ValueNode::default());
        }
    }

    fn enter_element(&mut self, element: &Element) {
        self.stack.push(ValueNode::new(element.local_name.clone()));
    }

    fn text(&mut self, value: &str) {
        if let Some(node) = self.stack.last_mut() {
            node.text.get_or_insert_with(String::new).push_str(value);
        }
    }

    fn leave_element(&mut self, _element: &Element) {
        if self.stack.len() > 1 {
            self.pop();
        }
    }
}

// ============================================================================
// CURSOR
// ============================================================================

struct Frame<'t> {
    node: &'t ValueNode,
    /// Index of the first child not yet handed out.
    next: usize,
}

/// Sequential reader over a [`ValueNode`] implementing [`ValueProvider`].
///
/// Each request takes the first unconsumed child with the node's element
/// name; children before it that were skipped stay skipped.
pub struct ValueCursor<'t> {
    stack: Vec<Frame<'t>>,
}

impl<'t> ValueCursor<'t> {
    pub fn new(node: &'t ValueNode) -> Self {
        Self {
            stack: vec![Frame { node, next: 0 }],
        }
    }

    fn take(&mut self, name: &str) -> Option<&'t ValueNode> {
        let frame = self.stack.last_mut()?;
        let node: &'t ValueNode = frame.node;
        let offset = node.children[frame.next..]
            .iter()
            .position(|child| child.name.as_str() == name)?;
        let index = frame.next + offset;
        frame.next = index + 1;
        Some(&node.children[index])
    }
}

impl ValueProvider for ValueCursor<'_> {
    fn enter(&mut self, node: MappingNode<'_>) -> bool {
        match self.take(node.xml_tag()) {
            Some(child) => {
                self.stack.push(Frame {
                    node: child,
                    next: 0,
                });
                true
            }
            None => false,
        }
    }

    fn leave(&mut self, _node: MappingNode<'_>) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    fn lookup(&mut self, node: MappingNode<'_>) -> Option<String> {
        self.take(node.xml_tag())
            .map(|child| child.text.clone().unwrap_or_default())
    }
}
