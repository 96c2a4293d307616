//! Envelope failures: blank control fields, trailer checks, unresolved models

use rstest::rstest;

use edistream::{EdiError, ErrorCode, EventRecorder, InterchangeParser};

use crate::helpers::fixtures::{GROUPED_INTERCHANGE, ORDERS_INTERCHANGE};
use crate::helpers::{parse_error, registry, strict};

#[rstest]
#[case::blank_interchange_ref("+REF42'\nUNH", "+'\nUNH", "UNB", 5)]
#[case::blank_message_ref("UNH+1+", "UNH++", "UNH", 1)]
#[case::blank_message_type("UNH+1+ORDERS:", "UNH+1+:", "UNH", 2)]
fn test_blank_control_field(
    #[case] from: &str,
    #[case] to: &str,
    #[case] segment: &str,
    #[case] field: usize,
) {
    let input = ORDERS_INTERCHANGE.replacen(from, to, 1);
    let err = parse_error(&input, strict());
    assert_eq!(err.code(), ErrorCode::E0402);
    assert!(
        matches!(err, EdiError::MissingControlField { ref segment_code, ordinal, .. } if segment_code == segment && ordinal == field),
        "unexpected error: {err}"
    );
}

#[test]
fn test_blank_group_reference_names_segment_and_field() {
    let input = GROUPED_INTERCHANGE.replace("+GRP1+UN+", "++UN+");
    let err = parse_error(&input, strict());
    let message = err.to_string();
    assert!(message.contains("UNG"), "{message}");
    assert!(message.contains('5'), "{message}");
    assert_eq!(err.position().map(|p| p.segment), Some(3));
}

#[test]
fn test_unresolved_message_model() {
    let input = ORDERS_INTERCHANGE.replace("ORDERS:D:96A", "DESADV:D:96A");
    let registry = registry();
    let parser = InterchangeParser::new(&registry, strict());
    let mut recorder = EventRecorder::new();

    let err = parser.parse(input.as_bytes(), &mut recorder).unwrap_err();

    assert_eq!(err.code(), ErrorCode::E0501);
    assert!(err.to_string().contains("DESADV:D:96A"), "{err}");
    assert_eq!(err.position().map(|p| p.segment), Some(3));
    assert!(!recorder.element_names().contains(&"message"));
}

#[rstest]
#[case::message_ref("UNT+12+1'", "UNT+12+2'", ErrorCode::E0403)]
#[case::interchange_ref("UNZ+1+REF42'", "UNZ+1+REF99'", ErrorCode::E0403)]
#[case::segment_count("UNT+12+1'", "UNT+11+1'", ErrorCode::E0302)]
#[case::message_count("UNZ+1+REF42'", "UNZ+2+REF42'", ErrorCode::E0302)]
fn test_trailer_checks(#[case] from: &str, #[case] to: &str, #[case] code: ErrorCode) {
    let input = ORDERS_INTERCHANGE.replace(from, to);
    assert_eq!(parse_error(&input, strict()).code(), code);
}

#[rstest]
#[case::group_count("UNE+2+GRP1'", "UNE+1+GRP1'", ErrorCode::E0302)]
#[case::group_ref("UNE+2+GRP1'", "UNE+2+GRP2'", ErrorCode::E0403)]
#[case::interchange_counts_groups("UNZ+1+REF7'", "UNZ+2+REF7'", ErrorCode::E0302)]
fn test_group_trailer_checks(#[case] from: &str, #[case] to: &str, #[case] code: ErrorCode) {
    let input = GROUPED_INTERCHANGE.replace(from, to);
    assert_eq!(parse_error(&input, strict()).code(), code);
}

#[test]
fn test_blank_trailer_count_is_not_checked() {
    let input = ORDERS_INTERCHANGE.replace("UNT+12+1'", "UNT++1'");
    crate::helpers::parse_interchange(&input, strict()).unwrap();
}

#[test]
fn test_count_mismatch_reports_declared_and_actual() {
    let input = ORDERS_INTERCHANGE.replace("UNT+12+1'", "UNT+20+1'");
    let message = parse_error(&input, strict()).to_string();
    assert!(message.contains("20"), "{message}");
    assert!(message.contains("12"), "{message}");
}

#[rstest]
#[case::missing_trailer(ORDERS_INTERCHANGE.replace("UNZ+1+REF42'\n", ""))]
#[case::empty_input(String::new())]
#[case::header_before_interchange(ORDERS_INTERCHANGE.replace("UNB+UNOA:1+SENDER+RECEIVER+240131:1200+REF42'\n", ""))]
#[case::message_trailer_outside_message(ORDERS_INTERCHANGE.replace("UNH+1+ORDERS:D:96A:UN'\n", "UNT+1+1'\nUNH+1+ORDERS:D:96A:UN'\n"))]
fn test_envelope_out_of_order(#[case] input: String) {
    assert_eq!(parse_error(&input, strict()).code(), ErrorCode::E0201);
}

#[test]
fn test_body_segment_outside_envelope() {
    let err = parse_error("BGM+220'", strict());
    assert_eq!(err.code(), ErrorCode::E0401);
    assert!(matches!(err, EdiError::UnknownControlBlock { ref segment_code, .. } if segment_code == "BGM"));
}

#[test]
fn test_unmapped_body_segment_is_rejected() {
    let input = ORDERS_INTERCHANGE.replace("DTM+137:20240131:102'\n", "DTM+137:20240131:102'\nFOO+1'\n");
    let err = parse_error(&input, strict());
    assert_eq!(err.code(), ErrorCode::E0202);
    assert!(matches!(err, EdiError::UnexpectedSegment { ref segment_code, .. } if segment_code == "FOO"));
    assert_eq!(err.position().map(|p| p.segment), Some(6));
}

#[test]
fn test_missing_required_body_segment() {
    let input = ORDERS_INTERCHANGE
        .replace("BGM+220+PO4711+9'\n", "")
        .replace("UNT+12+1'", "UNT+11+1'");
    let err = parse_error(&input, strict());
    assert!(
        matches!(err, EdiError::RequiredNodeMissing { ref path, .. } if path.ends_with("header")),
        "unexpected error: {err}"
    );
}

#[rstest]
#[case::field_equals_component("UNA::.? '")]
#[case::decimal_equals_component("UNA:+:? '")]
fn test_invalid_service_string_advice(#[case] una: &str) {
    let input = ORDERS_INTERCHANGE.replace("UNA:+.? '", una);
    assert_eq!(parse_error(&input, strict()).code(), ErrorCode::E0503);
}
