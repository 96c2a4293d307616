//! Error handling module
//!
//! This module provides the failure taxonomy for the engine:
//! - Categorized error codes for filtering and documentation
//! - One error enum covering input, structural, envelope and model failures
//! - Document positions and grammar paths on every input error

mod codes;
mod error;

pub use codes::ErrorCode;
pub use error::{EdiError, Result};
