//! Grammar-driven EDI writer
//!
//! Walks a mapping model in grammar order, pulls values from a
//! [`ValueProvider`] and writes delimited segments. Values are re-encoded
//! for their data type and escaped against the active delimiters.

use std::io::Write;

use tracing::trace;

use super::provider::ValueProvider;
use crate::base::{Delimiters, NodePath, Position};
use crate::config::EncoderConfig;
use crate::model::{Edimap, MappingNode, Segment, SegmentGroup, Structure};
use crate::parser::errors::{EdiError, ErrorCode, Result};
use crate::parser::split::escape;

/// Writes messages of one mapping model.
pub struct Encoder<'m, W: Write> {
    edimap: &'m Edimap,
    delimiters: Delimiters,
    config: EncoderConfig,
    out: W,
    segments: usize,
    chars: usize,
}

impl<'m, W: Write> Encoder<'m, W> {
    /// Create an encoder using the model's delimiters.
    pub fn new(edimap: &'m Edimap, out: W, config: EncoderConfig) -> Self {
        Self {
            edimap,
            delimiters: edimap.delimiters.clone(),
            config,
            out,
            segments: 0,
            chars: 0,
        }
    }

    /// Write with `delimiters` instead of the model's own.
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// Number of segments written so far.
    pub fn segments_written(&self) -> usize {
        self.segments
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Encode one message: the model root must be the provider's next occurrence.
    pub fn encode<P: ValueProvider>(&mut self, provider: &mut P) -> Result<()> {
        let edimap = self.edimap;
        let root = &edimap.root;
        let path = NodePath::root(root.props.name.as_str());
        let node = MappingNode::SegmentGroup(root);
        if !provider.enter(node) {
            return Err(EdiError::required_missing(self.position(), &path, None));
        }
        self.encode_group(root, provider, &path)?;
        provider.leave(node);
        self.out.flush()?;
        Ok(())
    }

    fn position(&self) -> Position {
        Position::segment(self.segments + 1)
    }

    fn encode_group<P: ValueProvider>(&mut self, group: &SegmentGroup, provider: &mut P, path: &NodePath) -> Result<()> {
        for child in &group.children {
            let props = child.props();
            let child_path = path.child(props.name.as_str());
            let node = child.as_node();
            let mut count = 0usize;
            while provider.enter(node) {
                count += 1;
                if !props.max_occurs.allows(count) {
                    return Err(EdiError::too_many(
                        self.position(),
                        &child_path,
                        format!("more than {} occurrences supplied", props.max_occurs),
                    ));
                }
                match child {
                    Structure::Segment(segment) => self.encode_segment(segment, provider, &child_path)?,
                    Structure::Group(nested) => self.encode_group(nested, provider, &child_path)?,
                }
                provider.leave(node);
            }
            let min = props.min_occurs.max(u32::from(props.required)) as usize;
            if count < min {
                return Err(EdiError::required_missing(self.position(), &child_path, None));
            }
        }
        Ok(())
    }

    fn encode_segment<P: ValueProvider>(&mut self, segment: &Segment, provider: &mut P, path: &NodePath) -> Result<()> {
        let fields: Vec<MappingNode<'_>> = segment.fields.iter().map(MappingNode::Field).collect();
        let tokens = self.encode_level(&fields, provider, path, segment.props.truncatable)?;

        let mut line = String::from(segment.code.as_str());
        for token in tokens {
            line.push(self.delimiters.field);
            line.push_str(&token);
        }
        line.push_str(&self.delimiters.segment);
        if self.config.line_break && !self.delimiters.segment.ends_with('\n') {
            line.push('\n');
        }
        trace!(code = %segment.code, "writing segment");
        self.out.write_all(line.as_bytes())?;
        self.segments += 1;
        self.chars += line.chars().count();
        Ok(())
    }

    /// Encode the children of one level.
    ///
    /// Absent values become empty tokens, except in a trailing run that is
    /// dropped when the level is truncatable.
    fn encode_level<P: ValueProvider>(
        &mut self,
        children: &[MappingNode<'_>],
        provider: &mut P,
        path: &NodePath,
        truncatable: bool,
    ) -> Result<Vec<String>> {
        let mut tokens = Vec::with_capacity(children.len());
        for child in children {
            tokens.push(self.encode_node(*child, provider, &path.child(child.name()))?);
        }

        let last_present = tokens.iter().rposition(Option::is_some);
        for (index, (child, token)) in children.iter().zip(&tokens).enumerate() {
            if token.is_some() || !child.props().is_mandatory() {
                continue;
            }
            let in_tail = last_present.is_none_or(|last| index > last);
            if !(truncatable && in_tail) {
                return Err(EdiError::required_missing(
                    self.position(),
                    path.child(child.name()),
                    None,
                ));
            }
        }

        let keep = if truncatable {
            last_present.map_or(0, |last| last + 1)
        } else {
            tokens.len()
        };
        Ok(tokens
            .into_iter()
            .take(keep)
            .map(Option::unwrap_or_default)
            .collect())
    }

    /// All occurrences of one field, component or sub-component.
    fn encode_node<P: ValueProvider>(
        &mut self,
        node: MappingNode<'_>,
        provider: &mut P,
        path: &NodePath,
    ) -> Result<Option<String>> {
        let props = node.props();
        let mut occurrences = Vec::new();
        while let Some(token) = self.encode_occurrence(node, provider, path)? {
            occurrences.push(token);
            if !props.max_occurs.allows(occurrences.len()) {
                return Err(EdiError::too_many(
                    self.position(),
                    path,
                    format!("more than {} values supplied", props.max_occurs),
                ));
            }
        }
        match occurrences.len() {
            0 => Ok(None),
            1 => Ok(occurrences.pop()),
            _ => {
                let Some(separator) = self.delimiters.repetition else {
                    return Err(EdiError::invalid_delimiters(format!(
                        "'{path}' repeats but no repetition separator is configured"
                    )));
                };
                Ok(Some(occurrences.join(&separator.to_string())))
            }
        }
    }

    /// One occurrence, or `None` when the provider has nothing left.
    ///
    /// An occurrence whose children are all absent counts as absent.
    fn encode_occurrence<P: ValueProvider>(
        &mut self,
        node: MappingNode<'_>,
        provider: &mut P,
        path: &NodePath,
    ) -> Result<Option<String>> {
        if node.is_leaf() {
            // An empty value is absent; the next one is tried.
            let value = loop {
                match provider.lookup(node) {
                    Some(value) if value.is_empty() => continue,
                    Some(value) => break value,
                    None => return Ok(None),
                }
            };
            let encoded = node
                .props()
                .data_type
                .unwrap_or_default()
                .encode(&value, self.delimiters.decimal)
                .into_owned();
            let escaped = escape(&encoded, &self.delimiters).map_err(|c| {
                EdiError::malformed(
                    ErrorCode::E0104,
                    self.chars,
                    format!("value {value:?} of '{path}' contains '{c}' and no escape character is configured"),
                )
            })?;
            return Ok(Some(escaped.into_owned()));
        }

        if !provider.enter(node) {
            return Ok(None);
        }
        let separator = match node {
            MappingNode::Field(_) => Some(self.delimiters.component),
            _ => self.delimiters.sub_component,
        };
        let children = node.children();
        let tokens = self.encode_level(&children, provider, path, node.props().truncatable)?;
        provider.leave(node);

        if tokens.iter().all(String::is_empty) {
            return Ok(None);
        }
        match separator {
            Some(separator) => Ok(Some(tokens.join(&separator.to_string()))),
            None if tokens.iter().skip(1).all(String::is_empty) => Ok(tokens.into_iter().next()),
            None => Err(EdiError::invalid_delimiters(format!(
                "'{path}' has sub-components but no sub-component separator is configured"
            ))),
        }
    }
}
