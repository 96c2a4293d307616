//! Foundation types for the edistream engine.
//!
//! This module provides the value types used throughout the crate:
//! - [`Delimiters`] - Separators, escape character and decimal sign
//! - [`Charset`] - Byte decodings understood by the segment reader
//! - [`Position`], [`NodePath`] - Diagnostic locations
//!
//! This module has NO dependencies on other edistream modules except the
//! shared error type.

mod charset;
mod delimiters;
mod position;

pub use charset::Charset;
pub use delimiters::Delimiters;
pub use position::{NodePath, Position};
