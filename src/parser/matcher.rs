//! Grammar-driven structural matcher
//!
//! Recursive descent over an [`Edimap`] with a single segment of lookahead
//! and no backtracking. Group children are tried in order against the code
//! of the next segment; matched segments are split and handed to the
//! [`SegmentDecoder`], which walks fields, components and sub-components and
//! reports leaf values to the sink.
//!
//! ```text
//! SegmentGroup ── children in order, each looped up to max_occurs
//!     │
//!     ├─ Segment ── peek code ── consume ── SegmentDecoder
//!     │                                        ├─ Field (repetitions)
//!     │                                        │    └─ Component
//!     │                                        │         └─ SubComponent
//!     └─ SegmentGroup (nested, matched by its first segment code)
//! ```

use std::io::Read;

use smol_str::SmolStr;
use tracing::{debug, trace};

use super::context::ParseContext;
use super::errors::{EdiError, Result};
use super::events::EventSink;
use super::split::{split_escaped, split_fields, unescape};
use super::tokenizer::SegmentReader;
use crate::base::{NodePath, Position};
use crate::config::{ParserConfig, UnmappedPolicy};
use crate::model::{Edimap, MappingNode, NodeKind, Segment, SegmentGroup, Structure, check_value};

/// Characters peeked to read a segment code: one more than the longest
/// valid code, so over-long codes never look known.
const CODE_PEEK: usize = 4;

// ============================================================================
// STRUCTURE MATCHING
// ============================================================================

/// Matches one message body against a mapping model.
pub struct Matcher<'a, R: Read, S: EventSink> {
    reader: &'a mut SegmentReader<R>,
    ctx: &'a mut ParseContext,
    sink: &'a mut S,
    edimap: &'a Edimap,
    policy: UnmappedPolicy,
    validate: bool,
    terminators: &'a [&'a str],
}

impl<'a, R: Read, S: EventSink> Matcher<'a, R, S> {
    pub fn new(
        reader: &'a mut SegmentReader<R>,
        ctx: &'a mut ParseContext,
        sink: &'a mut S,
        edimap: &'a Edimap,
        config: &ParserConfig,
    ) -> Self {
        Self {
            reader,
            ctx,
            sink,
            edimap,
            policy: edimap.unmapped_segments.unwrap_or(config.unmapped_segments),
            validate: config.validate,
            terminators: &[],
        }
    }

    /// Codes that end the body, such as the message trailer. They are left unread.
    pub fn with_terminators(mut self, terminators: &'a [&'a str]) -> Self {
        self.terminators = terminators;
        self
    }

    /// Match the whole model once, then skip or reject whatever is left
    /// before the next terminator.
    pub fn match_message(&mut self) -> Result<()> {
        let edimap = self.edimap;
        let root = &edimap.root;
        let path = NodePath::root(root.props.name.as_str());
        let namespace = root
            .props
            .namespace
            .as_deref()
            .unwrap_or(&edimap.description.namespace);
        let open = self.ctx.open_scope(
            &mut *self.sink,
            root.props.xml_tag(),
            namespace,
            edimap.description.prefix.as_deref(),
        );
        self.match_children(root, &path, &[])?;
        self.ctx.close(&mut *self.sink, open);

        while let Some(code) = self.peek_code(&path)? {
            if self.is_terminator(&code) {
                break;
            }
            if !self.policy.tolerates() {
                return Err(self.reject(code, &path)?);
            }
            debug!(code = %code, "skipping trailing segment");
            self.skip_segment()?;
        }
        Ok(())
    }

    /// `outer` holds the codes an enclosing scope can still take.
    fn match_children(&mut self, group: &'a SegmentGroup, path: &NodePath, outer: &[SmolStr]) -> Result<()> {
        for (index, child) in group.children.iter().enumerate() {
            let following = &group.children[index + 1..];
            self.match_structure(child, following, path, outer)?;
        }
        Ok(())
    }

    fn match_structure(
        &mut self,
        child: &'a Structure,
        following: &'a [Structure],
        path: &NodePath,
        outer: &[SmolStr],
    ) -> Result<()> {
        let props = child.props();
        let child_path = path.child(props.name.as_str());
        let min = props.min_occurs.max(u32::from(props.required)) as usize;
        let mut count = 0usize;

        while let Some(code) = self.peek_code(path)? {
            if child.matches(&code) {
                if !props.max_occurs.allows(count + 1) {
                    let claimed = following.iter().any(|s| s.matches(&code)) || outer.contains(&code);
                    if claimed {
                        break;
                    }
                    return Err(EdiError::too_many(
                        self.ctx.next_position(),
                        &child_path,
                        format!("'{code}' occurs more than {} times", props.max_occurs),
                    ));
                }
                count += 1;
                self.match_occurrence(child, following, &child_path, outer)?;
                continue;
            }

            if count >= min {
                break;
            }
            if self.is_terminator(&code) || !self.policy.tolerates() {
                return Err(EdiError::required_missing(
                    self.ctx.next_position(),
                    &child_path,
                    Some(&code),
                ));
            }
            debug!(code = %code, expected = %child_path, "discarding segment while looking for required node");
            self.skip_segment()?;
        }

        if count < min {
            return Err(EdiError::required_missing(self.ctx.next_position(), &child_path, None));
        }
        Ok(())
    }

    fn match_occurrence(
        &mut self,
        child: &'a Structure,
        following: &'a [Structure],
        path: &NodePath,
        outer: &[SmolStr],
    ) -> Result<()> {
        match child {
            Structure::Segment(segment) => {
                let raw = self.next_segment()?;
                trace!(code = %segment.code, segment = self.ctx.segment_number(), "matched segment");
                SegmentDecoder::new(self.ctx, &mut *self.sink, self.validate).decode(segment, &raw, path)
            }
            Structure::Group(group) => {
                let mut inner: Vec<SmolStr> = outer.to_vec();
                inner.extend(following.iter().filter_map(Structure::first_code).map(SmolStr::new));
                if group.props.max_occurs.repeats() {
                    inner.extend(group.first_code().map(SmolStr::new));
                }
                let open = self.ctx.open(
                    &mut *self.sink,
                    group.props.xml_tag(),
                    group.props.namespace.as_deref(),
                );
                self.match_children(group, path, &inner)?;
                self.ctx.close(&mut *self.sink, open);
                Ok(())
            }
        }
    }

    // =========================================================================
    // Segment access
    // =========================================================================

    fn is_terminator(&self, code: &str) -> bool {
        self.terminators.contains(&code)
    }

    /// Code of the next segment the grammar knows about, discarding unknown
    /// codes when tolerated. `None` at end of input.
    fn peek_code(&mut self, scope: &NodePath) -> Result<Option<SmolStr>> {
        loop {
            if self.reader.is_eof()? {
                return Ok(None);
            }
            let peeked = self.reader.peek(CODE_PEEK, false, &self.ctx.delimiters)?;
            let code = SmolStr::new(peeked.trim());
            if self.is_terminator(&code) || self.edimap.is_known_code(&code) {
                return Ok(Some(code));
            }
            if !self.policy.tolerates() {
                return Err(self.reject(code, scope)?);
            }
            debug!(code = %code, segment = self.ctx.segment_number() + 1, "skipping unmapped segment");
            self.skip_segment()?;
        }
    }

    /// Build the error for a segment that has no place in `scope`.
    fn reject(&mut self, code: SmolStr, scope: &NodePath) -> Result<EdiError> {
        let position = self.ctx.next_position();
        let raw = self.next_segment()?;
        Ok(EdiError::UnexpectedSegment {
            position,
            segment_code: code.to_string(),
            scope: scope.to_string(),
            raw,
        })
    }

    fn next_segment(&mut self) -> Result<String> {
        let position = self.ctx.next_position();
        let raw = self
            .reader
            .next_segment(&self.ctx.delimiters)?
            .ok_or_else(|| EdiError::required_missing(position, "segment", None))?;
        self.ctx.advance_segment();
        Ok(raw)
    }

    fn skip_segment(&mut self) -> Result<()> {
        self.next_segment().map(|_| ())
    }
}

// ============================================================================
// VALUE DECODING
// ============================================================================

/// Decodes the fields of one raw segment against its grammar.
///
/// Absent and empty tokens produce no events. A mandatory node that is
/// absent is an error unless its parent is truncatable and the record simply
/// ended early.
pub struct SegmentDecoder<'c, S: EventSink> {
    ctx: &'c mut ParseContext,
    sink: &'c mut S,
    validate: bool,
    segment_code: SmolStr,
    ignore_unmapped: bool,
}

impl<'c, S: EventSink> SegmentDecoder<'c, S> {
    pub fn new(ctx: &'c mut ParseContext, sink: &'c mut S, validate: bool) -> Self {
        Self {
            ctx,
            sink,
            validate,
            segment_code: SmolStr::default(),
            ignore_unmapped: false,
        }
    }

    /// Emit the element for `segment` with the values of `raw`.
    ///
    /// `raw` is the segment text without its terminator, code included.
    pub fn decode(&mut self, segment: &Segment, raw: &str, path: &NodePath) -> Result<()> {
        self.segment_code = segment.code.clone();
        self.ignore_unmapped = segment.ignore_unmapped_fields;

        let fields = split_fields(raw, &self.ctx.delimiters);
        let values = fields.get(1..).unwrap_or(&[]);
        let position = self.ctx.position();
        self.check_unmapped(values, segment.fields.len(), position)?;

        let open = self.ctx.open(
            &mut *self.sink,
            segment.props.xml_tag(),
            segment.props.namespace.as_deref(),
        );
        let children: Vec<MappingNode<'_>> = segment.fields.iter().map(MappingNode::Field).collect();
        self.decode_level(&children, values, segment.props.truncatable, path, position)?;
        self.ctx.close(&mut *self.sink, open);
        Ok(())
    }

    fn check_unmapped(&self, tokens: &[&str], mapped: usize, position: Position) -> Result<()> {
        if self.ignore_unmapped {
            return Ok(());
        }
        // Trailing empty tokens are padding, not data.
        let found = tokens.iter().rposition(|t| !t.is_empty()).map_or(0, |i| i + 1);
        if found > mapped {
            return Err(EdiError::UnmappedField {
                position,
                segment_code: self.segment_code.to_string(),
                mapped,
                found,
            });
        }
        Ok(())
    }

    fn decode_level(
        &mut self,
        children: &[MappingNode<'_>],
        tokens: &[&str],
        truncatable: bool,
        path: &NodePath,
        position: Position,
    ) -> Result<()> {
        for (index, node) in children.iter().enumerate() {
            let node_path = path.child(node.name());
            let at = locate(position, node.kind(), index + 1);
            match tokens.get(index) {
                Some(token) => self.decode_node(*node, token, &node_path, at)?,
                None if node.props().is_mandatory() && !truncatable => {
                    return Err(EdiError::required_missing(at, &node_path, None));
                }
                None => {
                    if node.props().is_mandatory() {
                        debug!(path = %node_path, "truncated tail");
                    }
                }
            }
        }
        Ok(())
    }

    fn decode_node(&mut self, node: MappingNode<'_>, token: &str, path: &NodePath, at: Position) -> Result<()> {
        let props = node.props();
        let repetition = match node {
            MappingNode::Field(_) if props.max_occurs.repeats() => self.ctx.delimiters.repetition,
            _ => None,
        };
        let occurrences = match repetition {
            Some(separator) => split_escaped(token, separator, self.ctx.delimiters.escape),
            None => vec![token],
        };
        if !props.max_occurs.allows(occurrences.len()) {
            return Err(EdiError::too_many(
                at,
                path,
                format!(
                    "{} repetitions exceed the maximum of {}",
                    occurrences.len(),
                    props.max_occurs
                ),
            ));
        }

        let mut present = 0;
        for occurrence in occurrences {
            if self.decode_occurrence(node, occurrence, path, at)? {
                present += 1;
            }
        }
        if present == 0 && props.is_mandatory() {
            return Err(EdiError::required_missing(at, path, None));
        }
        Ok(())
    }

    /// Returns false when the occurrence is empty and nothing was emitted.
    fn decode_occurrence(&mut self, node: MappingNode<'_>, token: &str, path: &NodePath, at: Position) -> Result<bool> {
        let props = node.props();
        if node.is_leaf() {
            let value = unescape(token, &self.ctx.delimiters);
            if value.is_empty() {
                return Ok(false);
            }
            let decoded = props
                .data_type
                .unwrap_or_default()
                .decode(&value, self.ctx.delimiters.decimal)
                .into_owned();
            if self.validate {
                check_value(props, &decoded).map_err(|reason| EdiError::InvalidValue {
                    position: at,
                    path: path.to_string(),
                    value: decoded.clone(),
                    reason,
                })?;
            }
            let open = self.ctx.open(&mut *self.sink, node.xml_tag(), props.namespace.as_deref());
            self.sink.text(&decoded);
            self.ctx.close(&mut *self.sink, open);
            return Ok(true);
        }

        let separator = match node {
            MappingNode::Field(_) => Some(self.ctx.delimiters.component),
            _ => self.ctx.delimiters.sub_component,
        };
        let parts = match separator {
            Some(separator) => split_escaped(token, separator, self.ctx.delimiters.escape),
            None => vec![token],
        };
        if parts.iter().all(|p| p.is_empty()) {
            return Ok(false);
        }

        let children = node.children();
        self.check_unmapped(&parts, children.len(), at)?;
        let open = self.ctx.open(&mut *self.sink, node.xml_tag(), props.namespace.as_deref());
        self.decode_level(&children, &parts, props.truncatable, path, at)?;
        self.ctx.close(&mut *self.sink, open);
        Ok(true)
    }
}

/// Position of the `ordinal`-th child of kind `kind` below `parent`.
fn locate(parent: Position, kind: NodeKind, ordinal: usize) -> Position {
    match kind {
        NodeKind::Field => Position::new(parent.segment, ordinal, 0),
        NodeKind::Component => Position {
            component: ordinal,
            ..parent
        },
        _ => parent,
    }
}
