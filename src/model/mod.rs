//! Mapping models (Edimaps): the grammar that drives parsing and encoding.
//!
//! ## Architecture
//!
//! ```text
//! Edimap
//! ├── description: name, version, namespace
//! ├── delimiters: default separators for the message
//! └── root: SegmentGroup
//!     └── Structure (Group | Segment) → Field → Component → SubComponent
//! ```
//!
//! Models are immutable once built. They are constructed in code with the
//! builder methods of [`NodeBuilder`], or deserialized with serde by the
//! registry. Call [`Edimap::validate`] before handing a model to a parser.

mod datatype;
mod edimap;
mod node;
mod validate;

pub use datatype::{DataType, check_value};
pub use edimap::{Description, Edimap, MessageKey};
pub use node::{
    Component, Field, MappingNode, NodeBuilder, NodeKind, NodeProps, Occurs, Segment,
    SegmentGroup, Structure, SubComponent,
};
pub use validate::SEGMENT_CODE_LEN;
