//! Structural invariants of a mapping model.
//!
//! Checked once when a model is built or loaded; the matcher and encoder
//! rely on them and do not re-check.

use rustc_hash::FxHashSet;

use super::{Edimap, MappingNode, NodeProps, SegmentGroup, Structure};
use crate::base::{Delimiters, NodePath};
use crate::parser::errors::{EdiError, Result};

/// Segment codes are two or three characters.
pub const SEGMENT_CODE_LEN: std::ops::RangeInclusive<usize> = 2..=3;

impl Edimap {
    /// Check the delimiters and every node of the grammar tree.
    pub fn validate(&self) -> Result<()> {
        self.delimiters.validate()?;
        let path = NodePath::root(self.root.props.name.as_str());
        validate_group(&self.root, &self.delimiters, &path)
    }
}

fn validate_group(group: &SegmentGroup, delimiters: &Delimiters, path: &NodePath) -> Result<()> {
    validate_props(&group.props, path)?;
    if group.children.is_empty() {
        return Err(EdiError::invalid_model(format!(
            "segment group '{path}' has no children"
        )));
    }

    let mut codes = FxHashSet::default();
    let mut tags = FxHashSet::default();
    for child in &group.children {
        let child_path = path.child(child.props().name.as_str());
        if !tags.insert(child.props().xml_tag()) {
            return Err(EdiError::invalid_model(format!(
                "duplicate element name '{}' under '{path}'",
                child.props().xml_tag()
            )));
        }
        match child {
            Structure::Group(nested) => validate_group(nested, delimiters, &child_path)?,
            Structure::Segment(segment) => {
                let code = segment.code.as_str();
                if !SEGMENT_CODE_LEN.contains(&code.chars().count()) {
                    return Err(EdiError::invalid_model(format!(
                        "segment code '{code}' at '{child_path}' must be 2 or 3 characters"
                    )));
                }
                if code.chars().any(|c| delimiters.is_reserved(c) || c.is_whitespace()) {
                    return Err(EdiError::invalid_model(format!(
                        "segment code '{code}' at '{child_path}' contains a delimiter"
                    )));
                }
                if !codes.insert(code) {
                    return Err(EdiError::invalid_model(format!(
                        "duplicate segment code '{code}' under '{path}'"
                    )));
                }
                validate_values(MappingNode::Segment(segment), &child_path)?;
            }
        }
    }
    Ok(())
}

/// Validate the value levels below a segment.
fn validate_values(node: MappingNode<'_>, path: &NodePath) -> Result<()> {
    validate_props(node.props(), path)?;
    let mut tags = FxHashSet::default();
    for child in node.children() {
        if !tags.insert(child.xml_tag()) {
            return Err(EdiError::invalid_model(format!(
                "duplicate element name '{}' under '{path}'",
                child.xml_tag()
            )));
        }
        validate_values(child, &path.child(child.name()))?;
    }
    Ok(())
}

fn validate_props(props: &NodeProps, path: &NodePath) -> Result<()> {
    if props.name.is_empty() {
        return Err(EdiError::invalid_model(format!("unnamed node under '{path}'")));
    }
    if !props.max_occurs.allows(props.min_occurs as usize) {
        return Err(EdiError::invalid_model(format!(
            "'{path}': minOccurs {} exceeds maxOccurs {}",
            props.min_occurs, props.max_occurs
        )));
    }
    if let (Some(min), Some(max)) = (props.min_length, props.max_length) {
        if min > max {
            return Err(EdiError::invalid_model(format!(
                "'{path}': minLength {min} exceeds maxLength {max}"
            )));
        }
    }
    Ok(())
}
