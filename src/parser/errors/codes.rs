//! Error code definitions for parser and encoder diagnostics
//!
//! Error codes follow a naming convention: E{category}{number}
//! - E01xx: Input errors (tokenization, decoding)
//! - E02xx: Structural errors (required, unexpected, unmapped)
//! - E03xx: Cardinality and value errors
//! - E04xx: Envelope (control block) errors
//! - E05xx: Model and registry errors
//! - E09xx: Generic/fallback errors

use std::fmt;

/// Error codes for parser and encoder diagnostics
///
/// Each error code represents a specific category of failure,
/// enabling filtering and documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // E01xx: Input errors
    // =========================================================================
    /// Input ended in the middle of a segment
    E0101,
    /// Escape character with nothing to escape
    E0102,
    /// Bytes that cannot be decoded with the active charset
    E0103,
    /// Value that cannot be written with the active delimiters
    E0104,

    // =========================================================================
    // E02xx: Structural errors
    // =========================================================================
    /// Required grammar node missing
    E0201,
    /// Segment not expected at this point
    E0202,
    /// Segment carries more fields than its grammar maps
    E0203,

    // =========================================================================
    // E03xx: Cardinality and value errors
    // =========================================================================
    /// Node repeated beyond its maximum occurrences
    E0301,
    /// Trailer count does not match the content
    E0302,
    /// Value violates its data type or length bounds
    E0303,

    // =========================================================================
    // E04xx: Envelope errors
    // =========================================================================
    /// Unknown top-level control block
    E0401,
    /// Mandatory control field is blank
    E0402,
    /// Trailer reference does not match its header
    E0403,

    // =========================================================================
    // E05xx: Model and registry errors
    // =========================================================================
    /// No mapping model for a message key
    E0501,
    /// Mapping model violates its invariants
    E0502,
    /// Delimiter set is unusable
    E0503,
    /// Mapping model archive could not be read
    E0504,

    // =========================================================================
    // E09xx: Generic/fallback errors
    // =========================================================================
    /// I/O failure of the underlying source or sink
    E0901,
}

impl ErrorCode {
    /// Get the string representation of the error code (e.g., "E0201")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E0101 => "E0101",
            Self::E0102 => "E0102",
            Self::E0103 => "E0103",
            Self::E0104 => "E0104",
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0203 => "E0203",
            Self::E0301 => "E0301",
            Self::E0302 => "E0302",
            Self::E0303 => "E0303",
            Self::E0401 => "E0401",
            Self::E0402 => "E0402",
            Self::E0403 => "E0403",
            Self::E0501 => "E0501",
            Self::E0502 => "E0502",
            Self::E0503 => "E0503",
            Self::E0504 => "E0504",
            Self::E0901 => "E0901",
        }
    }

    /// Get a short description of the error category
    pub fn category_description(&self) -> &'static str {
        match self {
            Self::E0101 | Self::E0102 | Self::E0103 | Self::E0104 => "input error",
            Self::E0201 | Self::E0202 | Self::E0203 => "structural error",
            Self::E0301 | Self::E0302 | Self::E0303 => "cardinality error",
            Self::E0401 | Self::E0402 | Self::E0403 => "envelope error",
            Self::E0501 | Self::E0502 | Self::E0503 | Self::E0504 => "model error",
            Self::E0901 => "i/o error",
        }
    }

    /// Get the default message template for this error code
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::E0101 => "unterminated segment",
            Self::E0102 => "dangling escape character",
            Self::E0103 => "undecodable input",
            Self::E0104 => "unescapable value",
            Self::E0201 => "required node missing",
            Self::E0202 => "unexpected segment",
            Self::E0203 => "unmapped field",
            Self::E0301 => "too many occurrences",
            Self::E0302 => "control count mismatch",
            Self::E0303 => "invalid value",
            Self::E0401 => "unknown control block",
            Self::E0402 => "blank control field",
            Self::E0403 => "control reference mismatch",
            Self::E0501 => "unresolved message model",
            Self::E0502 => "invalid mapping model",
            Self::E0503 => "invalid delimiters",
            Self::E0504 => "archive error",
            Self::E0901 => "i/o error",
        }
    }

    /// True for failures caused by the document rather than by configuration
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            Self::E0501 | Self::E0502 | Self::E0503 | Self::E0504 | Self::E0901
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
