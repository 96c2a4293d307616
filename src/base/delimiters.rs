//! Delimiter sets for flat EDI text.

use serde::{Deserialize, Serialize};

use crate::parser::errors::{EdiError, Result};

/// The tokens that separate the levels of a flat EDI document.
///
/// A set is an immutable value. An interchange may replace the active set
/// mid-stream (UN/EDIFACT `UNA`), but the set itself never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    /// Segment terminator. A trailing whitespace part (`"'\n"`) is optional on input.
    pub segment: String,
    pub field: char,
    pub component: char,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_component: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escape: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition: Option<char>,
    #[serde(default = "default_decimal")]
    pub decimal: char,
}

fn default_decimal() -> char {
    '.'
}

impl Default for Delimiters {
    /// The UN/EDIFACT level A defaults (`UNA:+.? '`).
    fn default() -> Self {
        Self::edifact()
    }
}

impl Delimiters {
    /// UN/EDIFACT service string advice defaults.
    pub fn edifact() -> Self {
        Self {
            segment: "'".to_string(),
            field: '+',
            component: ':',
            sub_component: None,
            escape: Some('?'),
            repetition: None,
            decimal: '.',
        }
    }

    /// Create a set with the three mandatory separators and nothing else.
    pub fn new(segment: impl Into<String>, field: char, component: char) -> Self {
        Self {
            segment: segment.into(),
            field,
            component,
            sub_component: None,
            escape: None,
            repetition: None,
            decimal: '.',
        }
    }

    pub fn with_sub_component(mut self, c: char) -> Self {
        self.sub_component = Some(c);
        self
    }

    pub fn with_escape(mut self, c: char) -> Self {
        self.escape = Some(c);
        self
    }

    pub fn with_repetition(mut self, c: char) -> Self {
        self.repetition = Some(c);
        self
    }

    pub fn with_decimal(mut self, c: char) -> Self {
        self.decimal = c;
        self
    }

    /// The significant part of the terminator, without its whitespace tail.
    ///
    /// For a terminator made only of whitespace (`"\n"`) the terminator
    /// itself is returned.
    pub fn terminator_core(&self) -> &str {
        let trimmed = self.segment.trim_end();
        if trimmed.is_empty() {
            &self.segment
        } else {
            trimmed
        }
    }

    /// True when the terminator carries an optional whitespace tail or is a
    /// bare line break, so `\r\n`/`\n` variants are accepted on input.
    pub fn is_whitespace_tolerant(&self) -> bool {
        self.segment.trim_end() != self.segment
    }

    /// Characters that must be escaped when they appear in a value.
    pub fn reserved_chars(&self) -> Vec<char> {
        let mut chars = vec![self.field, self.component];
        chars.extend(self.sub_component);
        chars.extend(self.repetition);
        chars.extend(self.escape);
        chars.extend(self.terminator_core().chars());
        chars
    }

    /// True if `c` is any separator, the escape character or part of the terminator.
    pub fn is_reserved(&self, c: char) -> bool {
        c == self.field
            || c == self.component
            || Some(c) == self.sub_component
            || Some(c) == self.repetition
            || Some(c) == self.escape
            || self.terminator_core().contains(c)
    }

    /// Check that every delimiter character is distinct.
    pub fn validate(&self) -> Result<()> {
        if self.terminator_core().is_empty() {
            return Err(EdiError::invalid_delimiters("segment terminator is empty"));
        }
        let mut seen: Vec<(char, &'static str)> = Vec::new();
        let mut check = |c: char, role: &'static str| -> Result<()> {
            if let Some((_, other)) = seen.iter().find(|(s, _)| *s == c) {
                return Err(EdiError::invalid_delimiters(format!(
                    "'{c}' is used both as {other} and as {role}"
                )));
            }
            seen.push((c, role));
            Ok(())
        };
        check(self.field, "field separator")?;
        check(self.component, "component separator")?;
        check(self.decimal, "decimal sign")?;
        if let Some(c) = self.sub_component {
            check(c, "sub-component separator")?;
        }
        if let Some(c) = self.escape {
            check(c, "escape character")?;
        }
        if let Some(c) = self.repetition {
            check(c, "repetition separator")?;
        }
        for c in self.terminator_core().chars() {
            check(c, "segment terminator")?;
        }
        Ok(())
    }
}
