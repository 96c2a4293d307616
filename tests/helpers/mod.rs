//! Shared models, fixtures and assertions for integration tests.

#![allow(dead_code)]

pub mod fixtures;
pub mod models;

use edistream::{EdiError, EventRecorder, InterchangeParser, ParserConfig, StaticRegistry, UnmappedPolicy};

/// Registry holding the ORDERS and INVOIC test models.
pub fn registry() -> StaticRegistry {
    StaticRegistry::from_models([models::orders(), models::invoic()]).expect("test models are valid")
}

pub fn strict() -> ParserConfig {
    ParserConfig::new(UnmappedPolicy::Reject)
}

pub fn lenient() -> ParserConfig {
    ParserConfig::new(UnmappedPolicy::Ignore)
}

/// Parse an interchange stream into recorded events.
pub fn parse_interchange(input: &str, config: ParserConfig) -> Result<EventRecorder, EdiError> {
    let registry = registry();
    let parser = InterchangeParser::new(&registry, config);
    let mut recorder = EventRecorder::new();
    parser.parse(input.as_bytes(), &mut recorder)?;
    Ok(recorder)
}

/// Parse an interchange that must fail, returning the error.
pub fn parse_error(input: &str, config: ParserConfig) -> EdiError {
    match parse_interchange(input, config) {
        Ok(recorder) => panic!("expected a parse error, got:\n{}", recorder.outline()),
        Err(err) => err,
    }
}
