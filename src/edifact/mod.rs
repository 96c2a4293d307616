//! UN/EDIFACT interchanges
//!
//! An interchange wraps messages in service segments:
//!
//! ```text
//! UNA:+.? '                       optional service string advice
//! UNB+UNOC:3+SENDER+RECIPIENT+…   interchange header
//!   UNG+…                         optional functional group
//!     UNH+1+ORDERS:D:96A:UN       message header, names the model
//!       …                         message body, matched against the model
//!     UNT+n+1                     message trailer
//!   UNE+…
//! UNZ+1+REF                       interchange trailer
//! ```
//!
//! The envelope elements are reported in their own namespace; each message
//! body is reported in the namespace of its mapping model.

pub mod control;
mod envelope;

use std::io::Read;

pub use envelope::{ENVELOPE_NAMESPACE, ENVELOPE_PREFIX, EnvelopeState};

use crate::base::{Charset, Delimiters};
use crate::config::ParserConfig;
use crate::parser::errors::Result;
use crate::parser::events::EventSink;
use crate::parser::tokenizer::SegmentReader;
use crate::registry::MappingRegistry;
use envelope::Envelope;

/// Parses streams of EDIFACT interchanges.
///
/// Holds no per-parse state; one instance may parse any number of streams.
pub struct InterchangeParser<'r> {
    registry: &'r dyn MappingRegistry,
    config: ParserConfig,
    delimiters: Delimiters,
    charset: Charset,
}

impl<'r> InterchangeParser<'r> {
    pub fn new(registry: &'r dyn MappingRegistry, config: ParserConfig) -> Self {
        Self {
            registry,
            config,
            delimiters: Delimiters::edifact(),
            charset: Charset::default(),
        }
    }

    /// Delimiters in effect until a UNA overrides them.
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// Byte decoding in effect until a UNB names another.
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse every interchange in `input`, reporting to `sink`.
    ///
    /// Returns the number of interchanges read.
    pub fn parse<R: Read, S: EventSink>(&self, input: R, sink: &mut S) -> Result<usize> {
        let mut reader = SegmentReader::new(input).with_charset(self.charset);
        reader.set_ignore_newlines(self.config.ignore_newlines);
        Envelope::new(reader, self.delimiters.clone(), sink, self.registry, &self.config).run()
    }
}
