//! Encoding values back into flat EDI text
//!
//! The inverse of [`crate::parser`]: the grammar is walked in order, values
//! are pulled from a [`ValueProvider`], escaped and joined with the active
//! delimiters.
//!
//! ```text
//! ValueProvider (e.g. ValueTree built from parse events)
//!     ↓
//! Encoder → grammar walk, escape, separators, terminators
//!     ↓
//! Write
//! ```

mod provider;
mod writer;

pub use provider::{ValueCursor, ValueNode, ValueProvider, ValueTree, ValueTreeBuilder};
pub use writer::Encoder;

use crate::config::EncoderConfig;
use crate::model::Edimap;
use crate::parser::errors::Result;

/// Encode one message into a string using the model's delimiters.
pub fn encode_to_string<P: ValueProvider>(
    edimap: &Edimap,
    provider: &mut P,
    config: EncoderConfig,
) -> Result<String> {
    let mut encoder = Encoder::new(edimap, Vec::new(), config);
    encoder.encode(provider)?;
    // Every token written came from a `&str`.
    Ok(String::from_utf8_lossy(&encoder.into_inner()).into_owned())
}
