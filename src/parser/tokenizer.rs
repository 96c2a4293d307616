//! Buffered segment reader
//!
//! Turns a byte stream into raw segment strings using the active
//! [`Delimiters`]. Escape pairs are kept in the returned text so the
//! splitter can still tell escaped separators apart; un-escaping happens
//! per leaf in [`super::split`].
//!
//! Lookahead is an index into a growable character buffer. [`SegmentReader::mark`]
//! pins the current index and [`SegmentReader::reset`] returns to it; the
//! buffer is compacted only while no mark is held, so lookahead stays bounded
//! to what control-code dispatch needs.

use std::io::{BufReader, Bytes, Read};

use crate::base::{Charset, Delimiters};
use crate::parser::errors::{EdiError, ErrorCode, Result};

/// Consumed characters kept before the buffer is compacted.
const COMPACT_THRESHOLD: usize = 4096;

/// Reads raw segments from a byte source.
pub struct SegmentReader<R: Read> {
    source: Bytes<BufReader<R>>,
    charset: Charset,
    buffer: Vec<char>,
    /// Read cursor into `buffer`.
    pos: usize,
    mark: Option<usize>,
    /// Absolute character offset of `buffer[0]`.
    base_offset: usize,
    ignore_newlines: bool,
}

impl<R: Read> SegmentReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source: BufReader::new(source).bytes(),
            charset: Charset::default(),
            buffer: Vec::new(),
            pos: 0,
            mark: None,
            base_offset: 0,
            ignore_newlines: false,
        }
    }

    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Switch the decoding of bytes not yet read into the buffer.
    pub fn set_charset(&mut self, charset: Charset) {
        self.charset = charset;
    }

    /// Skip bare line breaks between segments.
    pub fn set_ignore_newlines(&mut self, ignore: bool) {
        self.ignore_newlines = ignore;
    }

    /// Absolute character offset of the read cursor.
    pub fn offset(&self) -> usize {
        self.base_offset + self.pos
    }

    /// Remember the current position.
    pub fn mark(&mut self) {
        self.mark = Some(self.pos);
    }

    /// Return to the last mark and release it.
    pub fn reset(&mut self) {
        if let Some(mark) = self.mark.take() {
            self.pos = mark;
        }
    }

    /// True when only ignorable characters remain.
    pub fn is_eof(&mut self) -> Result<bool> {
        self.skip_ignorable()?;
        Ok(!self.fill(1)?)
    }

    /// Return up to `n` characters without advancing.
    ///
    /// When `include_delimiter` is false the result stops before the first
    /// field or component separator, terminator character or line break.
    pub fn peek(&mut self, n: usize, include_delimiter: bool, delimiters: &Delimiters) -> Result<String> {
        self.skip_ignorable()?;
        let terminator_start = delimiters.terminator_core().chars().next();
        self.mark();
        let mut out = String::new();
        let mut taken = 0;
        while taken < n {
            let Some(c) = self.next_char()? else { break };
            if !include_delimiter
                && (c == delimiters.field
                    || c == delimiters.component
                    || Some(c) == terminator_start
                    || c == '\r'
                    || c == '\n')
            {
                break;
            }
            out.push(c);
            taken += 1;
        }
        self.reset();
        Ok(out)
    }

    /// Read exactly the next `n` characters, or fewer at end of input.
    pub fn read_chars(&mut self, n: usize) -> Result<String> {
        let mut out = String::with_capacity(n);
        for _ in 0..n {
            match self.next_char()? {
                Some(c) => out.push(c),
                None => break,
            }
        }
        Ok(out)
    }

    /// Read the next segment, without its terminator.
    ///
    /// Returns `Ok(None)` at a clean end of input (nothing but whitespace
    /// left). Input that ends inside a segment is malformed.
    pub fn next_segment(&mut self, delimiters: &Delimiters) -> Result<Option<String>> {
        self.compact();
        self.skip_ignorable()?;

        let start = self.offset();
        let core = delimiters.terminator_core();
        let line_terminated = core == "\n";
        let mut segment = String::new();
        // Byte length up to the end of the last escape pair; a terminator
        // may not overlap it.
        let mut literal_end = 0;

        loop {
            let Some(c) = self.next_char()? else {
                if segment.trim().is_empty() {
                    return Ok(None);
                }
                return Err(EdiError::malformed(
                    ErrorCode::E0101,
                    start,
                    format!("input ended inside segment {segment:?}"),
                ));
            };

            if Some(c) == delimiters.escape {
                segment.push(c);
                let Some(escaped) = self.next_char()? else {
                    return Err(EdiError::malformed(
                        ErrorCode::E0102,
                        self.offset(),
                        "escape character at end of input",
                    ));
                };
                segment.push(escaped);
                literal_end = segment.len();
                continue;
            }

            segment.push(c);
            if segment.len() >= literal_end + core.len() && segment.ends_with(core) {
                segment.truncate(segment.len() - core.len());
                if line_terminated && segment.ends_with('\r') {
                    segment.pop();
                } else if delimiters.is_whitespace_tolerant() {
                    self.skip_line_break()?;
                }
                return Ok(Some(segment));
            }
        }
    }

    // =========================================================================
    // Character level
    // =========================================================================

    fn skip_ignorable(&mut self) -> Result<()> {
        if !self.ignore_newlines {
            return Ok(());
        }
        while let Some(c) = self.peek_char()? {
            if c != '\r' && c != '\n' {
                break;
            }
            self.pos += 1;
        }
        Ok(())
    }

    /// Consume one optional `\n` or `\r\n`.
    fn skip_line_break(&mut self) -> Result<()> {
        if self.peek_char()? == Some('\r') {
            self.pos += 1;
        }
        if self.peek_char()? == Some('\n') {
            self.pos += 1;
        }
        Ok(())
    }

    fn peek_char(&mut self) -> Result<Option<char>> {
        if self.fill(1)? {
            Ok(Some(self.buffer[self.pos]))
        } else {
            Ok(None)
        }
    }

    fn next_char(&mut self) -> Result<Option<char>> {
        let c = self.peek_char()?;
        if c.is_some() {
            self.pos += 1;
        }
        Ok(c)
    }

    /// Make sure `n` characters are available past the cursor.
    fn fill(&mut self, n: usize) -> Result<bool> {
        while self.buffer.len() - self.pos < n {
            match self.decode_char()? {
                Some(c) => self.buffer.push(c),
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    fn compact(&mut self) {
        if self.mark.is_none() && self.pos > COMPACT_THRESHOLD {
            self.buffer.drain(..self.pos);
            self.base_offset += self.pos;
            self.pos = 0;
        }
    }

    // =========================================================================
    // Byte decoding
    // =========================================================================

    fn next_byte(&mut self) -> Result<Option<u8>> {
        self.source.next().transpose().map_err(EdiError::from)
    }

    fn decode_char(&mut self) -> Result<Option<char>> {
        let Some(first) = self.next_byte()? else {
            return Ok(None);
        };
        match self.charset {
            Charset::Latin1 => Ok(Some(char::from(first))),
            Charset::Ascii if first.is_ascii() => Ok(Some(char::from(first))),
            Charset::Ascii => Err(self.undecodable(first)),
            Charset::Utf8 => self.decode_utf8(first).map(Some),
        }
    }

    fn decode_utf8(&mut self, first: u8) -> Result<char> {
        let width = match first {
            0x00..=0x7F => return Ok(char::from(first)),
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Err(self.undecodable(first)),
        };
        let mut bytes = [first, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            *slot = self.next_byte()?.ok_or_else(|| self.undecodable(first))?;
        }
        std::str::from_utf8(&bytes[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or_else(|| self.undecodable(first))
    }

    fn undecodable(&self, byte: u8) -> EdiError {
        EdiError::malformed(
            ErrorCode::E0103,
            self.base_offset + self.buffer.len(),
            format!("byte 0x{byte:02X} is not valid {}", self.charset),
        )
    }
}
