//! Parser and encoder options

use serde::{Deserialize, Serialize};

use crate::parser::errors::{EdiError, Result};

/// What to do with a segment the grammar does not expect.
///
/// Has no default. A parser configuration always states its policy and a
/// mapping model may override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedPolicy {
    /// Discard unmapped segments and keep matching.
    Ignore,
    /// Fail the parse on the first unmapped segment.
    Reject,
}

impl UnmappedPolicy {
    pub fn tolerates(&self) -> bool {
        matches!(self, Self::Ignore)
    }
}

/// Options for a parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserConfig {
    /// Policy for segments the grammar does not map
    pub unmapped_segments: UnmappedPolicy,
    /// Skip bare line breaks between segments
    #[serde(default = "default_true")]
    pub ignore_newlines: bool,
    /// Check leaf values against their data type and length bounds
    #[serde(default)]
    pub validate: bool,
}

fn default_true() -> bool {
    true
}

impl ParserConfig {
    pub fn new(unmapped_segments: UnmappedPolicy) -> Self {
        Self {
            unmapped_segments,
            ignore_newlines: true,
            validate: false,
        }
    }

    pub fn ignore_newlines(mut self, ignore: bool) -> Self {
        self.ignore_newlines = ignore;
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Load options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EdiError::invalid_model(format!("invalid parser configuration: {e}")))
    }
}

/// Options for the encoder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoderConfig {
    /// Write a line break after every segment terminator
    #[serde(default)]
    pub line_break: bool,
}

impl EncoderConfig {
    pub fn line_break(mut self, line_break: bool) -> Self {
        self.line_break = line_break;
        self
    }
}
