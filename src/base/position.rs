//! Location tracking for diagnostics
//!
//! Segment numbers are 1-based and count every segment read from the
//! input, control segments included. Paths name the grammar nodes from the
//! root of the active model down to the failing node.

/// A position inside the flat document, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// 1-based segment number (0 before the first segment is read)
    pub segment: usize,
    /// 1-based field ordinal within the segment (0 for the segment itself)
    pub field: usize,
    /// 1-based component ordinal within the field (0 for the field itself)
    pub component: usize,
}

impl Position {
    pub fn new(segment: usize, field: usize, component: usize) -> Self {
        Self {
            segment,
            field,
            component,
        }
    }

    pub fn segment(segment: usize) -> Self {
        Self::new(segment, 0, 0)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "segment {}", self.segment)?;
        if self.field > 0 {
            write!(f, ", field {}", self.field)?;
        }
        if self.component > 0 {
            write!(f, ", component {}", self.component)?;
        }
        Ok(())
    }
}

/// A slash-separated path of grammar node names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath {
    parts: Vec<String>,
}

impl NodePath {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            parts: vec![name.into()],
        }
    }

    /// A new path extended by one child name
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut parts = self.parts.clone();
        parts.push(name.into());
        Self { parts }
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.parts.push(name.into());
    }

    pub fn pop(&mut self) {
        self.parts.pop();
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.parts.join("/"))
    }
}
