//! # edistream
//!
//! Grammar-driven streaming parser and encoder for EDI and UN/EDIFACT.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! encoder   → Value providers, grammar-ordered EDI writer
//!   ↓
//! edifact   → Interchange envelope (UNA/UNB/UNG/UNH … UNZ)
//!   ↓
//! registry  → Mapping model lookup: static, lazy, archive
//!   ↓
//! parser    → Segment reader, structural matcher, events, errors
//!   ↓
//! model     → Edimap grammar, data types, value checks
//!   ↓
//! base      → Delimiters, charsets, positions
//! ```

// ============================================================================
// MODULES (dependency order: base → model → parser → registry → edifact → encoder)
// ============================================================================

/// Foundation types: delimiters, charsets, diagnostic positions
pub mod base;

/// Parser and encoder options
pub mod config;

/// Mapping models (Edimaps)
pub mod model;

/// Segment reader, structural matcher, event sinks and errors
pub mod parser;

/// Mapping model registries
pub mod registry;

/// UN/EDIFACT interchange envelope
pub mod edifact;

/// EDI writer driven by a mapping model
pub mod encoder;

// Re-export commonly needed items
pub use base::{Charset, Delimiters, NodePath, Position};
pub use config::{EncoderConfig, ParserConfig, UnmappedPolicy};
pub use edifact::InterchangeParser;
pub use encoder::{Encoder, ValueProvider, ValueTree, ValueTreeBuilder, encode_to_string};
pub use model::{Edimap, MessageKey};
pub use parser::{EdiError, ErrorCode, EventRecorder, EventSink, Result, parse_message};
pub use registry::{LazyRegistry, MappingRegistry, StaticRegistry};
