//! Streaming decoder for flat, delimiter-separated EDI text
//!
//! The parser turns a character stream into structural events, driven
//! entirely by a mapping model. Nothing is buffered beyond the segment being
//! decoded and the few characters of lookahead needed to read the next code.
//!
//! ## Architecture
//!
//! ```text
//! Read (bytes)
//!     ↓
//! SegmentReader → raw segments (escape pairs kept)
//!     ↓
//! split         → fields / components / sub-components
//!     ↓
//! Matcher       → grammar walk with one segment of lookahead
//!     ↓
//! EventSink     → begin / enter_element / text / leave_element / end
//! ```
//!
//! EDIFACT interchanges wrap this with an envelope layer; see
//! [`crate::edifact`].

pub mod context;
pub mod errors;
pub mod events;
pub mod matcher;
pub mod split;
pub mod tokenizer;

use std::io::Read;

pub use context::ParseContext;
pub use errors::{EdiError, ErrorCode, Result};
pub use events::{Attribute, Element, Event, EventRecorder, EventSink};
pub use matcher::{Matcher, SegmentDecoder};
pub use tokenizer::SegmentReader;

use crate::config::ParserConfig;
use crate::model::Edimap;

/// Parse one bare message (no interchange envelope) against `edimap`.
///
/// The model's delimiters are used as is. Every segment of the input must
/// belong to the message; unmapped ones are handled by the effective
/// [`UnmappedPolicy`](crate::config::UnmappedPolicy).
pub fn parse_message<R: Read, S: EventSink>(
    edimap: &Edimap,
    input: R,
    config: &ParserConfig,
    sink: &mut S,
) -> Result<()> {
    let mut reader = SegmentReader::new(input);
    reader.set_ignore_newlines(config.ignore_newlines);
    let mut ctx = ParseContext::new(edimap.delimiters.clone());

    sink.begin();
    Matcher::new(&mut reader, &mut ctx, sink, edimap, config).match_message()?;
    sink.end();
    Ok(())
}
