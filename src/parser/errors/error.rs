//! The error type shared by the tokenizer, matcher, envelope and encoder
//!
//! Every variant aborts the current parse or encode call. Variants raised
//! while reading a document carry the [`Position`] of the offending segment
//! and, where one exists, the grammar path and the raw token.

use thiserror::Error;

use super::codes::ErrorCode;
use crate::base::Position;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, EdiError>;

/// Errors raised while decoding or encoding EDI text.
#[derive(Debug, Error)]
pub enum EdiError {
    /// The character stream could not be tokenized.
    #[error("malformed input at character {offset}: {message}")]
    MalformedInput {
        code: ErrorCode,
        offset: usize,
        message: String,
    },

    /// A required grammar node could not be matched.
    #[error("{position}: required node '{path}' is missing{}", found_suffix(.found))]
    RequiredNodeMissing {
        position: Position,
        path: String,
        found: Option<String>,
    },

    /// A segment that belongs nowhere in the active grammar.
    #[error("{position}: unexpected segment '{segment_code}' in '{scope}' (raw: {raw:?})")]
    UnexpectedSegment {
        position: Position,
        segment_code: String,
        scope: String,
        raw: String,
    },

    /// A segment carrying more fields than its grammar maps.
    #[error("{position}: segment '{segment_code}' has {found} fields but only {mapped} are mapped")]
    UnmappedField {
        position: Position,
        segment_code: String,
        mapped: usize,
        found: usize,
    },

    /// A node repeated too often, or a trailer count that does not match.
    #[error("{position}: cardinality violation at '{path}': {message}")]
    CardinalityViolation {
        code: ErrorCode,
        position: Position,
        path: String,
        message: String,
    },

    /// A leaf value outside its data type or length bounds.
    #[error("{position}: invalid value {value:?} for '{path}': {reason}")]
    InvalidValue {
        position: Position,
        path: String,
        value: String,
        reason: String,
    },

    /// A control segment field that must carry a value is blank.
    #[error("{position}: {segment_code} field {ordinal} ({name}) must not be blank")]
    MissingControlField {
        position: Position,
        segment_code: String,
        ordinal: usize,
        name: &'static str,
    },

    /// A trailer reference differs from the reference of its header.
    #[error("{position}: {segment_code} reference {found:?} does not match header reference {expected:?}")]
    ControlReferenceMismatch {
        position: Position,
        segment_code: String,
        expected: String,
        found: String,
    },

    /// A top-level segment that is not a known control block.
    #[error("{position}: unknown control block '{segment_code}'")]
    UnknownControlBlock {
        position: Position,
        segment_code: String,
    },

    /// The registry has no model for a message key.
    #[error("{position}: no mapping model registered for message '{key}'")]
    UnresolvedMessageModel { position: Position, key: String },

    /// A mapping model violates its structural invariants.
    #[error("invalid mapping model: {0}")]
    InvalidModel(String),

    /// A delimiter set is unusable.
    #[error("invalid delimiters: {0}")]
    InvalidDelimiters(String),

    /// A mapping model archive could not be read.
    #[error("archive error: {0}")]
    Archive(String),

    /// I/O failure of the source or the output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn found_suffix(found: &Option<String>) -> String {
    match found {
        Some(token) => format!(" (found {token:?})"),
        None => String::new(),
    }
}

impl EdiError {
    /// The diagnostic code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedInput { code, .. } => *code,
            Self::RequiredNodeMissing { .. } => ErrorCode::E0201,
            Self::UnexpectedSegment { .. } => ErrorCode::E0202,
            Self::UnmappedField { .. } => ErrorCode::E0203,
            Self::CardinalityViolation { code, .. } => *code,
            Self::InvalidValue { .. } => ErrorCode::E0303,
            Self::UnknownControlBlock { .. } => ErrorCode::E0401,
            Self::MissingControlField { .. } => ErrorCode::E0402,
            Self::ControlReferenceMismatch { .. } => ErrorCode::E0403,
            Self::UnresolvedMessageModel { .. } => ErrorCode::E0501,
            Self::InvalidModel(_) => ErrorCode::E0502,
            Self::InvalidDelimiters(_) => ErrorCode::E0503,
            Self::Archive(_) => ErrorCode::E0504,
            Self::Io(_) => ErrorCode::E0901,
        }
    }

    /// The document position of the failure, if it has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::RequiredNodeMissing { position, .. }
            | Self::UnexpectedSegment { position, .. }
            | Self::UnmappedField { position, .. }
            | Self::CardinalityViolation { position, .. }
            | Self::InvalidValue { position, .. }
            | Self::MissingControlField { position, .. }
            | Self::ControlReferenceMismatch { position, .. }
            | Self::UnknownControlBlock { position, .. }
            | Self::UnresolvedMessageModel { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Format the error prefixed with its code.
    pub fn format(&self) -> String {
        format!("{}: {}", self.code(), self)
    }

    /// Attach a segment position to an error raised away from the input.
    pub fn at(mut self, at: Position) -> Self {
        if let Self::UnresolvedMessageModel { position, .. } = &mut self {
            *position = at;
        }
        self
    }

    /// Create a malformed input error.
    pub fn malformed(code: ErrorCode, offset: usize, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            code,
            offset,
            message: message.into(),
        }
    }

    /// Create a required node error.
    pub fn required_missing(position: Position, path: impl ToString, found: Option<&str>) -> Self {
        Self::RequiredNodeMissing {
            position,
            path: path.to_string(),
            found: found.map(str::to_string),
        }
    }

    /// Create an occurrence limit error.
    pub fn too_many(position: Position, path: impl ToString, message: impl Into<String>) -> Self {
        Self::CardinalityViolation {
            code: ErrorCode::E0301,
            position,
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// Create a trailer count mismatch error.
    pub fn count_mismatch(
        position: Position,
        path: impl ToString,
        declared: &str,
        actual: usize,
    ) -> Self {
        Self::CardinalityViolation {
            code: ErrorCode::E0302,
            position,
            path: path.to_string(),
            message: format!("declared count {declared} but found {actual}"),
        }
    }

    /// Create a model error.
    pub fn invalid_model(message: impl Into<String>) -> Self {
        Self::InvalidModel(message.into())
    }

    /// Create a delimiter error.
    pub fn invalid_delimiters(message: impl Into<String>) -> Self {
        Self::InvalidDelimiters(message.into())
    }

    /// Create an archive error.
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive(message.into())
    }

    /// Create a registry miss.
    pub fn unresolved(key: impl ToString) -> Self {
        Self::UnresolvedMessageModel {
            position: Position::default(),
            key: key.to_string(),
        }
    }
}
