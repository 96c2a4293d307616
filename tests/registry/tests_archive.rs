//! Parsing with models loaded from a zip archive

use std::io::Write;

use rstest::rstest;

use edistream::registry::{ArchiveRegistry, LoadMode, write_archive};
use edistream::{EventRecorder, InterchangeParser, MappingRegistry, MessageKey};

use crate::helpers::fixtures::{GROUPED_INTERCHANGE, ORDERS_INTERCHANGE};
use crate::helpers::models::{invoic, orders};
use crate::helpers::strict;

fn archive_file() -> tempfile::NamedTempFile {
    let bytes = write_archive(&[orders(), invoic()]).unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();
    file
}

#[rstest]
#[case::eager(LoadMode::Eager, 2)]
#[case::lazy(LoadMode::Lazy, 1)]
fn test_parse_with_archive_models(#[case] mode: LoadMode, #[case] loaded: usize) {
    let file = archive_file();
    let registry = ArchiveRegistry::open(file.path(), mode).unwrap();
    let parser = InterchangeParser::new(&registry, strict());
    let mut recorder = EventRecorder::new();

    parser.parse(ORDERS_INTERCHANGE.as_bytes(), &mut recorder).unwrap();

    assert_eq!(recorder.text_of("docNumber"), Some("PO4711"));
    assert_eq!(registry.loaded(), loaded);
}

#[test]
fn test_archive_models_equal_their_source() {
    let file = archive_file();
    let registry = ArchiveRegistry::open(file.path(), LoadMode::Eager).unwrap();
    let keys: Vec<String> = registry.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["ORDERS:D:96A", "INVOIC:D:01B"]);

    let model = registry.resolve(&MessageKey::new("INVOIC", "D:01B")).unwrap();
    assert_eq!(*model, invoic());
}

#[test]
fn test_closed_lazy_archive_keeps_loaded_models() {
    let file = archive_file();
    let registry = ArchiveRegistry::open(file.path(), LoadMode::Lazy).unwrap();
    let parser = InterchangeParser::new(&registry, strict());
    parser.parse(ORDERS_INTERCHANGE.as_bytes(), &mut EventRecorder::new()).unwrap();

    registry.close().unwrap();

    parser.parse(ORDERS_INTERCHANGE.as_bytes(), &mut EventRecorder::new()).unwrap();
    let err = parser
        .parse(GROUPED_INTERCHANGE.as_bytes(), &mut EventRecorder::new())
        .unwrap_err();
    assert_eq!(err.code(), edistream::ErrorCode::E0501);
}

#[test]
fn test_missing_archive_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ArchiveRegistry::open(dir.path().join("missing.zip"), LoadMode::Eager).unwrap_err();
    assert_eq!(err.code(), edistream::ErrorCode::E0504);
}
