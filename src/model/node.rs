//! Mapping nodes: the grammar tree of an Edimap.
//!
//! ## Design
//!
//! The five node levels are typed structs so a segment can only hold fields,
//! a field only components, and so on. [`MappingNode`] is a closed sum of
//! borrowed views over those structs; the matcher, the encoder and the value
//! providers use it wherever they treat every level alike.
//!
//! ```text
//! SegmentGroup
//! ├── children: Vec<Structure>        (Group | Segment, order significant)
//! Segment
//! ├── code: "BGM"
//! └── fields: Vec<Field>
//!     └── components: Vec<Component>
//!         └── sub_components: Vec<SubComponent>
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::DataType;

// ============================================================================
// OCCURRENCES
// ============================================================================

/// Upper bound on the number of occurrences of a node.
///
/// Serialized as an integer where `-1` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Occurs {
    Bounded(u32),
    Unbounded,
}

impl Occurs {
    /// True if `count` occurrences are still within the bound.
    pub fn allows(&self, count: usize) -> bool {
        match self {
            Self::Bounded(max) => count <= *max as usize,
            Self::Unbounded => true,
        }
    }

    /// True if more than one occurrence is permitted.
    pub fn repeats(&self) -> bool {
        !matches!(self, Self::Bounded(0) | Self::Bounded(1))
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::Bounded(1)
    }
}

impl From<i64> for Occurs {
    fn from(value: i64) -> Self {
        if value < 0 {
            Self::Unbounded
        } else {
            Self::Bounded(u32::try_from(value).unwrap_or(u32::MAX))
        }
    }
}

impl From<Occurs> for i64 {
    fn from(value: Occurs) -> Self {
        match value {
            Occurs::Bounded(max) => i64::from(max),
            Occurs::Unbounded => -1,
        }
    }
}

impl std::fmt::Display for Occurs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bounded(max) => write!(f, "{max}"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

// ============================================================================
// SHARED PROPERTIES
// ============================================================================

/// Properties carried by every mapping node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProps {
    pub name: SmolStr,
    /// Element name in the event stream; the node name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_tag: Option<SmolStr>,
    /// Namespace override for this node and its descendants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub min_occurs: u32,
    #[serde(default)]
    pub max_occurs: Occurs,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub truncatable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub data_type_parameters: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl NodeProps {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            xml_tag: None,
            namespace: None,
            min_occurs: 0,
            max_occurs: Occurs::default(),
            required: false,
            truncatable: false,
            data_type: None,
            data_type_parameters: IndexMap::new(),
            min_length: None,
            max_length: None,
            documentation: None,
        }
    }

    /// The element name used in the event stream.
    pub fn xml_tag(&self) -> &str {
        self.xml_tag.as_deref().unwrap_or(&self.name)
    }

    /// A node is mandatory when flagged required or when it must occur at least once.
    pub fn is_mandatory(&self) -> bool {
        self.required || self.min_occurs > 0
    }
}

/// Builder-style setters shared by every node type.
pub trait NodeBuilder: Sized {
    fn props_mut(&mut self) -> &mut NodeProps;

    fn xml_tag(mut self, tag: impl Into<SmolStr>) -> Self {
        self.props_mut().xml_tag = Some(tag.into());
        self
    }

    fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.props_mut().namespace = Some(namespace.into());
        self
    }

    /// Mark the node mandatory (at least one occurrence).
    fn required(mut self) -> Self {
        let props = self.props_mut();
        props.required = true;
        props.min_occurs = props.min_occurs.max(1);
        self
    }

    fn min_occurs(mut self, min: u32) -> Self {
        self.props_mut().min_occurs = min;
        self
    }

    fn max_occurs(mut self, max: Occurs) -> Self {
        self.props_mut().max_occurs = max;
        self
    }

    fn truncatable(mut self) -> Self {
        self.props_mut().truncatable = true;
        self
    }

    fn data_type(mut self, data_type: DataType) -> Self {
        self.props_mut().data_type = Some(data_type);
        self
    }

    fn data_type_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props_mut()
            .data_type_parameters
            .insert(key.into(), value.into());
        self
    }

    fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        let props = self.props_mut();
        props.min_length = min;
        props.max_length = max;
        self
    }

    fn documentation(mut self, text: impl Into<String>) -> Self {
        self.props_mut().documentation = Some(text.into());
        self
    }
}

// ============================================================================
// NODE TYPES
// ============================================================================

/// An ordered group of segments and nested groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentGroup {
    #[serde(flatten)]
    pub props: NodeProps,
    #[serde(default)]
    pub children: Vec<Structure>,
}

/// A child of a segment group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Structure {
    Group(SegmentGroup),
    Segment(Segment),
}

/// One record of the flat format, identified by its code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(flatten)]
    pub props: NodeProps,
    pub code: SmolStr,
    #[serde(default)]
    pub ignore_unmapped_fields: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(flatten)]
    pub props: NodeProps,
    #[serde(default)]
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(flatten)]
    pub props: NodeProps,
    #[serde(default)]
    pub sub_components: Vec<SubComponent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubComponent {
    #[serde(flatten)]
    pub props: NodeProps,
}

impl SegmentGroup {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            props: NodeProps::new(name),
            children: Vec::new(),
        }
    }

    pub fn segment(mut self, segment: Segment) -> Self {
        self.children.push(Structure::Segment(segment));
        self
    }

    pub fn group(mut self, group: SegmentGroup) -> Self {
        self.children.push(Structure::Group(group));
        self
    }

    /// Code of the first descendant segment, which decides whether the group matches.
    pub fn first_code(&self) -> Option<&str> {
        self.children.first().and_then(Structure::first_code)
    }
}

impl Structure {
    pub fn props(&self) -> &NodeProps {
        match self {
            Self::Group(group) => &group.props,
            Self::Segment(segment) => &segment.props,
        }
    }

    pub fn first_code(&self) -> Option<&str> {
        match self {
            Self::Group(group) => group.first_code(),
            Self::Segment(segment) => Some(&segment.code),
        }
    }

    /// True if a segment with `code` starts an occurrence of this node.
    pub fn matches(&self, code: &str) -> bool {
        self.first_code() == Some(code)
    }

    pub fn as_node(&self) -> MappingNode<'_> {
        match self {
            Self::Group(group) => MappingNode::SegmentGroup(group),
            Self::Segment(segment) => MappingNode::Segment(segment),
        }
    }
}

impl Segment {
    pub fn new(code: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            props: NodeProps::new(name),
            code: code.into(),
            ignore_unmapped_fields: false,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn ignore_unmapped_fields(mut self) -> Self {
        self.ignore_unmapped_fields = true;
        self
    }
}

impl Field {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            props: NodeProps::new(name),
            components: Vec::new(),
        }
    }

    pub fn component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn is_composite(&self) -> bool {
        !self.components.is_empty()
    }
}

impl Component {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            props: NodeProps::new(name),
            sub_components: Vec::new(),
        }
    }

    pub fn sub_component(mut self, sub: SubComponent) -> Self {
        self.sub_components.push(sub);
        self
    }

    pub fn is_composite(&self) -> bool {
        !self.sub_components.is_empty()
    }
}

impl SubComponent {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            props: NodeProps::new(name),
        }
    }
}

macro_rules! impl_node_builder {
    ($($ty:ty),* $(,)?) => {
        $(
            impl NodeBuilder for $ty {
                fn props_mut(&mut self) -> &mut NodeProps {
                    &mut self.props
                }
            }
        )*
    };
}

impl_node_builder!(SegmentGroup, Segment, Field, Component, SubComponent);

// ============================================================================
// BORROWED VIEW
// ============================================================================

/// Node level, for diagnostics and generic traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    SegmentGroup,
    Segment,
    Field,
    Component,
    SubComponent,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SegmentGroup => "segment group",
            Self::Segment => "segment",
            Self::Field => "field",
            Self::Component => "component",
            Self::SubComponent => "sub-component",
        }
    }
}

/// A borrowed grammar node of any level.
///
/// Two views are the same grammar node when they point at the same struct;
/// see [`MappingNode::same_node`].
#[derive(Debug, Clone, Copy)]
pub enum MappingNode<'a> {
    SegmentGroup(&'a SegmentGroup),
    Segment(&'a Segment),
    Field(&'a Field),
    Component(&'a Component),
    SubComponent(&'a SubComponent),
}

impl<'a> MappingNode<'a> {
    pub fn props(&self) -> &'a NodeProps {
        match self {
            Self::SegmentGroup(n) => &n.props,
            Self::Segment(n) => &n.props,
            Self::Field(n) => &n.props,
            Self::Component(n) => &n.props,
            Self::SubComponent(n) => &n.props,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::SegmentGroup(_) => NodeKind::SegmentGroup,
            Self::Segment(_) => NodeKind::Segment,
            Self::Field(_) => NodeKind::Field,
            Self::Component(_) => NodeKind::Component,
            Self::SubComponent(_) => NodeKind::SubComponent,
        }
    }

    pub fn name(&self) -> &'a str {
        &self.props().name
    }

    pub fn xml_tag(&self) -> &'a str {
        self.props().xml_tag()
    }

    /// True for nodes that carry a text value rather than children.
    pub fn is_leaf(&self) -> bool {
        match self {
            Self::SegmentGroup(_) | Self::Segment(_) => false,
            Self::Field(n) => !n.is_composite(),
            Self::Component(n) => !n.is_composite(),
            Self::SubComponent(_) => true,
        }
    }

    /// Direct children in grammar order.
    pub fn children(&self) -> Vec<MappingNode<'a>> {
        match self {
            Self::SegmentGroup(n) => n.children.iter().map(Structure::as_node).collect(),
            Self::Segment(n) => n.fields.iter().map(MappingNode::Field).collect(),
            Self::Field(n) => n.components.iter().map(MappingNode::Component).collect(),
            Self::Component(n) => n.sub_components.iter().map(MappingNode::SubComponent).collect(),
            Self::SubComponent(_) => Vec::new(),
        }
    }

    /// Identity comparison: both views borrow the very same node.
    pub fn same_node(&self, other: &MappingNode<'_>) -> bool {
        std::ptr::eq(self.props(), other.props())
    }
}
