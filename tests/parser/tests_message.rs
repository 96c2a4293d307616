//! Bare message parsing against a mapping model

use rstest::rstest;

use edistream::config::UnmappedPolicy;
use edistream::model::{Edimap, NodeBuilder, Segment, SegmentGroup, Structure};
use edistream::{EdiError, ErrorCode, EventRecorder, ParserConfig, parse_message};

use crate::helpers::fixtures::{ORDERS_BODY, invoic_interchange};
use crate::helpers::models::{invoic, orders};
use crate::helpers::{lenient, parse_interchange, strict};

fn parse(edimap: &Edimap, input: &str, config: &ParserConfig) -> Result<EventRecorder, EdiError> {
    let mut recorder = EventRecorder::new();
    parse_message(edimap, input.as_bytes(), config, &mut recorder)?;
    Ok(recorder)
}

#[test]
fn test_orders_outline() {
    let recorder = parse(&orders(), ORDERS_BODY, &strict()).unwrap();
    let expected = "\
ord:Order
  ord:header
    ord:docName
      ord:code
        = \"220\"
    ord:docNumber
      = \"PO4711\"
    ord:function
      = \"9\"
  ord:date
    ord:dateTime
      ord:qualifier
        = \"137\"
      ord:value
        = \"20240131\"
      ord:format
        = \"102\"
  ord:party
    ord:nameAddress
      ord:qualifier
        = \"BY\"
      ord:partyId
        ord:id
          = \"5412345000013\"
        ord:agency
          = \"9\"
  ord:line
    ord:item
      ord:lineNumber
        = \"1\"
      ord:itemId
        ord:id
          = \"4000862141404\"
        ord:type
          = \"SRS\"
    ord:quantity
      ord:quantity
        ord:qualifier
          = \"21\"
        ord:amount
          = \"48\"
  ord:line
    ord:item
      ord:lineNumber
        = \"2\"
    ord:quantity
      ord:quantity
        ord:qualifier
          = \"21\"
        ord:amount
          = \"3.75\"
";
    assert_eq!(recorder.outline(), expected);
}

#[test]
fn test_too_many_repetitions() {
    let input = format!("{ORDERS_BODY}QTY+1:1'QTY+2:2'QTY+3:3'");
    let err = parse(&orders(), &input, &strict()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0301);
    assert!(matches!(err, EdiError::CardinalityViolation { ref path, .. } if path == "Order/line/quantity"));
}

#[test]
fn test_repeated_segment_is_claimed_by_enclosing_group() {
    let input = format!("{ORDERS_BODY}LIN+3'CNT+2:3'");
    let recorder = parse(&orders(), &input, &strict()).unwrap();
    assert_eq!(recorder.element_names().iter().filter(|n| **n == "line").count(), 3);
    assert!(recorder.element("controlTotal").is_some());
}

#[test]
fn test_unmapped_trailing_field() {
    let input = ORDERS_BODY.replace("BGM+220+PO4711+9'", "BGM+220+PO4711+9+EXTRA'");
    let err = parse(&orders(), &input, &strict()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0203);
    assert!(matches!(err, EdiError::UnmappedField { mapped: 3, found: 4, .. }));
}

#[test]
fn test_trailing_empty_fields_are_padding() {
    let input = ORDERS_BODY.replace("BGM+220+PO4711+9'", "BGM+220+PO4711+9++'");
    parse(&orders(), &input, &strict()).unwrap();
}

#[test]
fn test_segment_ignoring_unmapped_fields() {
    let mut edimap = orders();
    let children = std::mem::take(&mut edimap.root.children);
    edimap.root.children = children
        .into_iter()
        .map(|child| match child {
            Structure::Segment(segment) if segment.code.as_str() == "BGM" => {
                Structure::Segment(segment.ignore_unmapped_fields())
            }
            other => other,
        })
        .collect();
    let input = ORDERS_BODY.replace("BGM+220+PO4711+9'", "BGM+220+PO4711+9+EXTRA'");
    parse(&edimap, &input, &strict()).unwrap();
}

#[test]
fn test_empty_mandatory_component() {
    let input = ORDERS_BODY.replace("QTY+21:48'", "QTY+:48'");
    let err = parse(&orders(), &input, &strict()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0201);
    assert!(matches!(err, EdiError::RequiredNodeMissing { ref path, .. } if path.ends_with("quantity/qualifier")));
}

#[test]
fn test_model_policy_overrides_config() {
    let input = format!("FOO+1'{ORDERS_BODY}");
    let tolerant = orders().with_unmapped_segments(UnmappedPolicy::Ignore);
    parse(&tolerant, &input, &strict()).unwrap();

    let rejecting = orders().with_unmapped_segments(UnmappedPolicy::Reject);
    let err = parse(&rejecting, &input, &lenient()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0202);
}

#[test]
fn test_misplaced_segment_discarded_before_required_node() {
    let input = format!("DTM+1:2'{ORDERS_BODY}");
    let recorder = parse(&orders(), &input, &lenient()).unwrap();
    assert_eq!(recorder.text_of("docNumber"), Some("PO4711"));
    assert_eq!(recorder.element_names().iter().filter(|n| **n == "date").count(), 1);
    assert_eq!(recorder.text_of("qualifier"), Some("137"));

    let err = parse(&orders(), &input, &strict()).unwrap_err();
    assert!(matches!(err, EdiError::RequiredNodeMissing { ref found, .. } if found.as_deref() == Some("DTM")));
}

#[test]
fn test_required_node_search_stops_at_message_trailer() {
    let input = invoic_interchange(&["FTX+AAI+X'", "MOA+77:1'"]);
    let err = parse_interchange(&input, lenient()).unwrap_err();
    match err {
        EdiError::RequiredNodeMissing { path, found, position } => {
            assert_eq!(path, "Invoice/header");
            assert_eq!(found.as_deref(), Some("UNT"));
            assert_eq!(position.segment, 5);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_required_node_search_stops_at_end_of_input() {
    let err = parse(&orders(), "DTM+1:2'NAD+BY'", &lenient()).unwrap_err();
    assert!(matches!(
        err,
        EdiError::RequiredNodeMissing { ref path, found: None, .. } if path == "Order/header"
    ));
}

#[test]
fn test_trailing_unmapped_segments() {
    let input = format!("{ORDERS_BODY}ZZZ+1'");
    parse(&orders(), &input, &lenient()).unwrap();
    let err = parse(&orders(), &input, &strict()).unwrap_err();
    assert!(matches!(err, EdiError::UnexpectedSegment { ref raw, .. } if raw == "ZZZ+1"));
}

#[rstest]
#[case::escaped_plus("FTX+AAI+A?+B'", "A+B")]
#[case::escaped_colon("FTX+AAI+A?:B'", "A:B")]
#[case::escaped_escape("FTX+AAI+A??B'", "A?B")]
#[case::escaped_terminator("FTX+AAI+IT?'S'", "IT'S")]
fn test_escaped_values(#[case] segment: &str, #[case] expected: &str) {
    let input = format!("BGM+380+INV1'{segment}");
    let recorder = parse(&invoic(), &input, &strict()).unwrap();
    assert_eq!(recorder.text_of("text"), Some(expected));
}

#[rstest]
#[case::not_a_number("MOA+77:12X'", "value")]
#[case::number_too_long("BGM+380+INV000000001'", "docNumber")]
fn test_validation(#[case] segment: &str, #[case] node: &str) {
    let input = if segment.starts_with("BGM") {
        segment.to_string()
    } else {
        format!("BGM+380+INV1'{segment}")
    };
    let config = strict().validate(true);
    let err = parse(&invoic(), &input, &config).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0303);
    assert!(matches!(err, EdiError::InvalidValue { ref path, .. } if path.ends_with(node)), "{err}");

    // Without validation the same input decodes.
    parse(&invoic(), &input, &strict()).unwrap();
}

#[test]
fn test_incomplete_segment_is_malformed() {
    let err = parse(&orders(), "BGM+220+PO4711", &strict()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0101);
}

#[test]
fn test_required_segment_missing_at_end_of_input() {
    let err = parse(&orders(), "", &strict()).unwrap_err();
    assert!(matches!(err, EdiError::RequiredNodeMissing { ref path, found: None, .. } if path == "Order/header"));
}

#[test]
fn test_segment_without_fields() {
    let edimap = Edimap::new(
        orders().description,
        edistream::Delimiters::edifact(),
        SegmentGroup::new("Order").segment(Segment::new("UNS", "section").required()),
    );
    let recorder = parse(&edimap, "UNS'", &strict()).unwrap();
    assert_eq!(recorder.element_names(), vec!["Order", "section"]);
}
