//! Models built on first request

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use edistream::{ErrorCode, EventRecorder, InterchangeParser, LazyRegistry};

use crate::helpers::fixtures::{GROUPED_INTERCHANGE, ORDERS_INTERCHANGE};
use crate::helpers::models::{invoic, orders};
use crate::helpers::strict;

#[test]
fn test_loader_runs_once_per_key() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let registry = LazyRegistry::new(move |key| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(match key.name.as_str() {
            "ORDERS" => Some(orders()),
            "INVOIC" => Some(invoic()),
            _ => None,
        })
    });
    let parser = InterchangeParser::new(&registry, strict());

    parser.parse(ORDERS_INTERCHANGE.as_bytes(), &mut EventRecorder::new()).unwrap();
    parser.parse(ORDERS_INTERCHANGE.as_bytes(), &mut EventRecorder::new()).unwrap();
    parser.parse(GROUPED_INTERCHANGE.as_bytes(), &mut EventRecorder::new()).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(registry.loaded(), 2);
}

#[test]
fn test_unknown_key_is_unresolved() {
    let registry = LazyRegistry::new(|_| Ok(None));
    let parser = InterchangeParser::new(&registry, strict());
    let err = parser
        .parse(ORDERS_INTERCHANGE.as_bytes(), &mut EventRecorder::new())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0501);
}
