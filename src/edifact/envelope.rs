//! Interchange envelope state machine
//!
//! ```text
//! AwaitingCustomDelimiters ──UNA──▶ AwaitingInterchangeHeader
//!          │                                  │
//!          └──────────────UNB─────────────────┴──▶ InInterchange ◀──UNE── InGroup
//!                                                   │   │  ▲                 │ ▲
//!                                                   │   │  └──UNT── InMessage┘ │
//!                                                   │   └─UNG──────────────────┘
//!                                                  UNZ      (UNH opens InMessage
//!                                                   ▼        from either scope)
//!                                            InterchangeClosed ──UNA/UNB──▶ ...
//! ```
//!
//! Control segments are decoded against the built-in grammars in
//! [`super::control`]; message bodies are handed to the [`Matcher`] with the
//! model the registry resolves for the UNH message identifier.

use std::io::Read;

use tracing::{debug, trace, warn};

use super::control::{
    BODY_TERMINATORS, UNA, UNA_LENGTH, UNB, UNE, UNG, UNH, UNT, UNZ, control_segments, syntax_encoding,
};
use crate::base::{Charset, Delimiters, NodePath, Position};
use crate::config::ParserConfig;
use crate::model::{MessageKey, Segment};
use crate::parser::context::{OpenElement, ParseContext};
use crate::parser::errors::{EdiError, ErrorCode, Result};
use crate::parser::events::EventSink;
use crate::parser::split::{split_escaped, split_fields, unescape};
use crate::parser::{Matcher, SegmentDecoder, SegmentReader};
use crate::registry::MappingRegistry;

/// Namespace of the envelope elements.
pub const ENVELOPE_NAMESPACE: &str = "urn:edistream:unedifact:v41";
/// Prefix of the envelope elements.
pub const ENVELOPE_PREFIX: &str = "env";

/// Where the envelope parser is within an interchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    AwaitingCustomDelimiters,
    AwaitingInterchangeHeader,
    InInterchange,
    InGroup,
    InMessage { grouped: bool },
    InterchangeClosed,
}

impl EnvelopeState {
    /// The state after accepting control segment `code`, or `None` if the
    /// code is not allowed here.
    pub fn on_segment(self, code: &str) -> Option<Self> {
        use EnvelopeState::*;
        let next = match (self, code) {
            (AwaitingCustomDelimiters | InterchangeClosed, UNA) => AwaitingInterchangeHeader,
            (AwaitingCustomDelimiters | AwaitingInterchangeHeader | InterchangeClosed, UNB) => InInterchange,
            (InInterchange, UNG) => InGroup,
            (InInterchange, UNH) => InMessage { grouped: false },
            (InGroup, UNH) => InMessage { grouped: true },
            (InMessage { grouped: false }, UNT) => InInterchange,
            (InMessage { grouped: true }, UNT) => InGroup,
            (InGroup, UNE) => InInterchange,
            (InInterchange, UNZ) => InterchangeClosed,
            _ => return None,
        };
        Some(next)
    }

    /// Path of the control segment this state is waiting for, used when
    /// something else arrives.
    pub fn expected(self) -> &'static str {
        match self {
            Self::AwaitingCustomDelimiters | Self::AwaitingInterchangeHeader | Self::InterchangeClosed => {
                "interchange/UNB"
            }
            Self::InInterchange => "interchange/UNZ",
            Self::InGroup => "interchange/group/UNE",
            Self::InMessage { grouped: true } => "interchange/group/message/UNT",
            Self::InMessage { grouped: false } => "interchange/message/UNT",
        }
    }
}

struct InterchangeScope {
    element: OpenElement,
    control_ref: String,
    groups: usize,
    messages: usize,
}

struct GroupScope {
    element: OpenElement,
    group_ref: String,
    messages: usize,
}

struct MessageScope {
    element: OpenElement,
    message_ref: String,
    /// Segment number of the UNH.
    start: usize,
}

/// Drives one input stream through the envelope.
pub(crate) struct Envelope<'p, R: Read, S: EventSink> {
    reader: SegmentReader<R>,
    ctx: ParseContext,
    sink: &'p mut S,
    registry: &'p dyn MappingRegistry,
    config: &'p ParserConfig,
    initial: Delimiters,
    initial_charset: Charset,
    state: EnvelopeState,
    interchange: Option<InterchangeScope>,
    group: Option<GroupScope>,
    message: Option<MessageScope>,
    interchanges: usize,
}

impl<'p, R: Read, S: EventSink> Envelope<'p, R, S> {
    pub(crate) fn new(
        reader: SegmentReader<R>,
        delimiters: Delimiters,
        sink: &'p mut S,
        registry: &'p dyn MappingRegistry,
        config: &'p ParserConfig,
    ) -> Self {
        let initial_charset = reader.charset();
        Self {
            reader,
            ctx: ParseContext::new(delimiters.clone()),
            sink,
            registry,
            config,
            initial: delimiters,
            initial_charset,
            state: EnvelopeState::AwaitingCustomDelimiters,
            interchange: None,
            group: None,
            message: None,
            interchanges: 0,
        }
    }

    /// Parse every interchange in the stream and return how many there were.
    pub(crate) fn run(mut self) -> Result<usize> {
        self.sink.begin();
        while !self.reader.is_eof()? {
            let head = self.reader.peek(UNA.len(), true, &self.ctx.delimiters)?;
            let code = if head == UNA {
                head
            } else {
                self.reader.peek(4, false, &self.ctx.delimiters)?.trim().to_string()
            };
            trace!(code = %code, state = ?self.state, "envelope dispatch");

            match code.as_str() {
                UNA | UNB | UNG | UNH | UNT | UNE | UNZ => {
                    let Some(next) = self.state.on_segment(&code) else {
                        return Err(EdiError::required_missing(
                            self.ctx.next_position(),
                            self.state.expected(),
                            Some(&code),
                        ));
                    };
                    match code.as_str() {
                        UNA => self.read_una()?,
                        UNB => self.read_unb()?,
                        UNG => self.read_ung()?,
                        UNH => self.read_unh()?,
                        UNT => self.read_unt()?,
                        UNE => self.read_une()?,
                        _ => self.read_unz()?,
                    }
                    self.state = next;
                }
                other if other.starts_with('U') => {
                    let raw = self.next_segment()?;
                    debug!(code = %other, segment = self.ctx.segment_number(), raw = %raw, "passing over control block");
                }
                other => {
                    return Err(EdiError::UnknownControlBlock {
                        position: self.ctx.next_position(),
                        segment_code: other.to_string(),
                    });
                }
            }
        }

        match self.state {
            EnvelopeState::InterchangeClosed => {}
            state => {
                return Err(EdiError::required_missing(
                    self.ctx.next_position(),
                    state.expected(),
                    None,
                ));
            }
        }
        self.sink.end();
        Ok(self.interchanges)
    }

    // =========================================================================
    // Service string advice and headers
    // =========================================================================

    fn read_una(&mut self) -> Result<()> {
        let start = self.reader.offset();
        let una: Vec<char> = self.reader.read_chars(UNA_LENGTH)?.chars().collect();
        let &[_, _, _, component, field, decimal, escape, repetition, terminator] = una.as_slice() else {
            return Err(EdiError::malformed(
                ErrorCode::E0101,
                start,
                "service string advice is shorter than 9 characters",
            ));
        };

        let mut delimiters = Delimiters::new(terminator.to_string(), field, component).with_decimal(decimal);
        if escape != ' ' {
            delimiters = delimiters.with_escape(escape);
        }
        if repetition != ' ' {
            delimiters = delimiters.with_repetition(repetition);
        }
        delimiters.validate()?;
        self.ctx.advance_segment();
        debug!(?delimiters, "service string advice");
        self.ctx.delimiters = delimiters;
        Ok(())
    }

    fn read_unb(&mut self) -> Result<()> {
        let raw = self.next_segment()?;
        let position = self.ctx.position();
        let fields = split_fields(&raw, &self.ctx.delimiters);

        let syntax_id = self.component(&fields, 1, 0);
        match syntax_encoding(&syntax_id) {
            Some(encoding) => match Charset::from_encoding_name(encoding) {
                Some(charset) => self.reader.set_charset(charset),
                None => warn!(
                    syntax_id = %syntax_id,
                    encoding,
                    current = %self.reader.charset(),
                    "interchange encoding is not decodable; keeping the current charset"
                ),
            },
            None => warn!(syntax_id = %syntax_id, "unknown syntax identifier"),
        }

        let control_ref = self.required_field(&fields, position, UNB, 5, "interchange control reference")?;
        let element = self.ctx.open_scope(
            &mut *self.sink,
            "interchange",
            ENVELOPE_NAMESPACE,
            Some(ENVELOPE_PREFIX),
        );
        self.decode(&control_segments().unb, &raw, "interchange")?;
        self.interchange = Some(InterchangeScope {
            element,
            control_ref,
            groups: 0,
            messages: 0,
        });
        Ok(())
    }

    fn read_ung(&mut self) -> Result<()> {
        let raw = self.next_segment()?;
        let position = self.ctx.position();
        let fields = split_fields(&raw, &self.ctx.delimiters);
        let group_ref = self.required_field(&fields, position, UNG, 5, "group reference")?;

        let element = self.ctx.open(&mut *self.sink, "group", None);
        self.decode(&control_segments().ung, &raw, "interchange/group")?;
        self.group = Some(GroupScope {
            element,
            group_ref,
            messages: 0,
        });
        Ok(())
    }

    fn read_unh(&mut self) -> Result<()> {
        let raw = self.next_segment()?;
        let position = self.ctx.position();
        let fields = split_fields(&raw, &self.ctx.delimiters);
        let message_ref = self.required_field(&fields, position, UNH, 1, "message reference")?;
        let message_type = self.component(&fields, 2, 0);
        if message_type.is_empty() {
            return Err(EdiError::MissingControlField {
                position,
                segment_code: UNH.to_string(),
                ordinal: 2,
                name: "message type",
            });
        }
        let key = MessageKey::new(
            message_type,
            format!("{}:{}", self.component(&fields, 2, 1), self.component(&fields, 2, 2)),
        );
        let edimap = self.registry.resolve(&key).map_err(|e| e.at(position))?;
        trace!(key = %key, segment = position.segment, "resolved message model");

        let element = self.ctx.open(&mut *self.sink, "message", None);
        self.decode(&control_segments().unh, &raw, self.message_path())?;
        self.message = Some(MessageScope {
            element,
            message_ref,
            start: position.segment,
        });

        Matcher::new(&mut self.reader, &mut self.ctx, &mut *self.sink, &edimap, self.config)
            .with_terminators(BODY_TERMINATORS)
            .match_message()
    }

    // =========================================================================
    // Trailers
    // =========================================================================

    fn read_unt(&mut self) -> Result<()> {
        let raw = self.next_segment()?;
        let position = self.ctx.position();
        let fields = split_fields(&raw, &self.ctx.delimiters);
        let Some(scope) = self.message.take() else {
            return Err(EdiError::required_missing(position, self.message_path(), Some(UNT)));
        };

        let found = self.field(&fields, 2);
        check_reference(position, UNT, &scope.message_ref, &found)?;
        let actual = position.segment - scope.start + 1;
        self.check_count(&fields, position, "message/UNT/segmentCount", actual)?;

        self.decode(&control_segments().unt, &raw, self.message_path())?;
        self.ctx.close(&mut *self.sink, scope.element);
        match (self.group.as_mut(), self.interchange.as_mut()) {
            (Some(group), _) => group.messages += 1,
            (None, Some(interchange)) => interchange.messages += 1,
            (None, None) => {}
        }
        Ok(())
    }

    fn read_une(&mut self) -> Result<()> {
        let raw = self.next_segment()?;
        let position = self.ctx.position();
        let fields = split_fields(&raw, &self.ctx.delimiters);
        let Some(scope) = self.group.take() else {
            return Err(EdiError::required_missing(position, "interchange/group", Some(UNE)));
        };

        let found = self.field(&fields, 2);
        check_reference(position, UNE, &scope.group_ref, &found)?;
        self.check_count(&fields, position, "group/UNE/groupCount", scope.messages)?;

        self.decode(&control_segments().une, &raw, "interchange/group")?;
        self.ctx.close(&mut *self.sink, scope.element);
        if let Some(interchange) = self.interchange.as_mut() {
            interchange.groups += 1;
        }
        Ok(())
    }

    fn read_unz(&mut self) -> Result<()> {
        let raw = self.next_segment()?;
        let position = self.ctx.position();
        let fields = split_fields(&raw, &self.ctx.delimiters);
        let Some(scope) = self.interchange.take() else {
            return Err(EdiError::required_missing(position, "interchange", Some(UNZ)));
        };

        let found = self.field(&fields, 2);
        check_reference(position, UNZ, &scope.control_ref, &found)?;
        // The count is of groups when the interchange uses them, else of messages.
        let actual = if scope.groups > 0 { scope.groups } else { scope.messages };
        self.check_count(&fields, position, "interchange/UNZ/controlCount", actual)?;

        self.decode(&control_segments().unz, &raw, "interchange")?;
        self.ctx.close(&mut *self.sink, scope.element);

        self.interchanges += 1;
        self.ctx.delimiters = self.initial.clone();
        self.reader.set_charset(self.initial_charset);
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn next_segment(&mut self) -> Result<String> {
        let position = self.ctx.next_position();
        let raw = self
            .reader
            .next_segment(&self.ctx.delimiters)?
            .ok_or_else(|| EdiError::required_missing(position, self.state.expected(), None))?;
        self.ctx.advance_segment();
        Ok(raw)
    }

    fn decode(&mut self, segment: &Segment, raw: &str, scope: &str) -> Result<()> {
        let path = NodePath::root(scope).child(segment.props.xml_tag());
        SegmentDecoder::new(&mut self.ctx, &mut *self.sink, self.config.validate).decode(segment, raw, &path)
    }

    fn message_path(&self) -> &'static str {
        if self.group.is_some() {
            "interchange/group/message"
        } else {
            "interchange/message"
        }
    }

    /// Un-escaped value of field `ordinal` (1-based; 0 is the code).
    fn field(&self, fields: &[&str], ordinal: usize) -> String {
        let raw = fields.get(ordinal).copied().unwrap_or_default();
        unescape(raw, &self.ctx.delimiters).into_owned()
    }

    /// Un-escaped value of component `index` (0-based) of field `ordinal`.
    fn component(&self, fields: &[&str], ordinal: usize, index: usize) -> String {
        let d = &self.ctx.delimiters;
        let raw = fields.get(ordinal).copied().unwrap_or_default();
        let components = split_escaped(raw, d.component, d.escape);
        let value = components.get(index).copied().unwrap_or_default();
        unescape(value, d).into_owned()
    }

    fn required_field(
        &self,
        fields: &[&str],
        position: Position,
        segment_code: &str,
        ordinal: usize,
        name: &'static str,
    ) -> Result<String> {
        let value = self.field(fields, ordinal);
        if value.trim().is_empty() {
            return Err(EdiError::MissingControlField {
                position,
                segment_code: segment_code.to_string(),
                ordinal,
                name,
            });
        }
        Ok(value)
    }

    /// Compare the count in field 1 of a trailer with what was seen.
    fn check_count(&self, fields: &[&str], position: Position, path: &str, actual: usize) -> Result<()> {
        let declared = self.field(fields, 1);
        let declared = declared.trim();
        if declared.is_empty() {
            return Ok(());
        }
        match declared.parse::<usize>() {
            Ok(count) if count == actual => Ok(()),
            _ => Err(EdiError::count_mismatch(position, path, declared, actual)),
        }
    }
}

fn check_reference(position: Position, segment_code: &str, expected: &str, found: &str) -> Result<()> {
    if expected != found {
        return Err(EdiError::ControlReferenceMismatch {
            position,
            segment_code: segment_code.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}
