//! Interchange envelope: service string advice, headers, scopes and namespaces

use edistream::edifact::{ENVELOPE_NAMESPACE, ENVELOPE_PREFIX};
use edistream::parser::Event;
use edistream::{Delimiters, ErrorCode, EventRecorder, InterchangeParser};

use crate::helpers::fixtures::{GROUPED_INTERCHANGE, ORDERS_INTERCHANGE, PLAIN_INTERCHANGE, invoic_interchange};
use crate::helpers::models::ORDERS_NS;
use crate::helpers::{lenient, parse_error, parse_interchange, registry, strict};

fn count(recorder: &EventRecorder, name: &str) -> usize {
    recorder.element_names().iter().filter(|n| **n == name).count()
}

#[test]
fn test_syntax_identifier_is_reported() {
    let recorder = parse_interchange(ORDERS_INTERCHANGE, strict()).unwrap();
    assert_eq!(recorder.text_of("id"), Some("UNOA"));
    assert_eq!(recorder.text_of("versionNum"), Some("1"));
    assert_eq!(recorder.text_of("controlRef"), Some("REF42"));
}

#[test]
fn test_undecodable_syntax_identifier_keeps_charset() {
    let input = ORDERS_INTERCHANGE.replace("UNB+UNOA:1", "UNB+UNOD:3");
    let recorder = parse_interchange(&input, strict()).unwrap();
    assert_eq!(recorder.text_of("id"), Some("UNOD"));
    assert_eq!(recorder.text_of("docNumber"), Some("PO4711"));
}

#[test]
fn test_envelope_element_order() {
    let recorder = parse_interchange(ORDERS_INTERCHANGE, strict()).unwrap();
    let names = recorder.element_names();
    let position = |name: &str| names.iter().position(|n| *n == name).unwrap();

    assert_eq!(names[0], "interchange");
    assert_eq!(names[1], "UNB");
    assert!(position("UNB") < position("message"));
    assert!(position("message") < position("UNH"));
    assert!(position("UNH") < position("Order"));
    assert!(position("Order") < position("UNT"));
    assert!(position("UNT") < position("UNZ"));
    assert_eq!(recorder.events.first(), Some(&Event::Begin));
    assert_eq!(recorder.events.last(), Some(&Event::End));
}

#[test]
fn test_envelope_and_message_namespaces() {
    let recorder = parse_interchange(ORDERS_INTERCHANGE, strict()).unwrap();

    let interchange = recorder.element("interchange").unwrap();
    assert_eq!(interchange.namespace, ENVELOPE_NAMESPACE);
    assert_eq!(interchange.qualified_name, format!("{ENVELOPE_PREFIX}:interchange"));
    assert!(interchange
        .attributes
        .iter()
        .any(|a| a.name == "xmlns:env" && a.value == ENVELOPE_NAMESPACE));

    let unb = recorder.element("UNB").unwrap();
    assert_eq!(unb.namespace, ENVELOPE_NAMESPACE);
    assert!(unb.attributes.is_empty());

    let order = recorder.element("Order").unwrap();
    assert_eq!(order.namespace, ORDERS_NS);
    assert_eq!(order.qualified_name, "ord:Order");
    assert!(order.attributes.iter().any(|a| a.name == "xmlns:ord" && a.value == ORDERS_NS));

    let header = recorder.element("header").unwrap();
    assert_eq!(header.namespace, ORDERS_NS);
    assert!(header.attributes.is_empty());
}

#[test]
fn test_message_body_values() {
    let recorder = parse_interchange(ORDERS_INTERCHANGE, strict()).unwrap();
    assert_eq!(recorder.text_of("docNumber"), Some("PO4711"));
    assert_eq!(recorder.text_of("name"), Some("ANNE DOE"));
    assert_eq!(count(&recorder, "party"), 2);
    assert_eq!(count(&recorder, "line"), 2);
    assert!(recorder.texts().contains(&"12.5"));
}

#[test]
fn test_functional_group_with_two_messages() {
    let recorder = parse_interchange(GROUPED_INTERCHANGE, strict()).unwrap();
    assert_eq!(count(&recorder, "group"), 1);
    assert_eq!(count(&recorder, "UNG"), 1);
    assert_eq!(count(&recorder, "UNE"), 1);
    assert_eq!(count(&recorder, "message"), 2);
    assert_eq!(recorder.text_of("groupRef"), Some("GRP1"));
}

#[test]
fn test_repetition_separator_from_service_string_advice() {
    let recorder = parse_interchange(GROUPED_INTERCHANGE, strict()).unwrap();
    assert_eq!(count(&recorder, "text"), 2);
    let texts = recorder.texts();
    assert!(texts.contains(&"FIRST LINE"));
    assert!(texts.contains(&"SECOND LINE"));
}

#[test]
fn test_multiple_interchanges_restore_delimiters() {
    let registry = registry();
    let parser = InterchangeParser::new(&registry, strict());
    let input = format!("{ORDERS_INTERCHANGE}{PLAIN_INTERCHANGE}");
    let mut recorder = EventRecorder::new();

    let interchanges = parser.parse(input.as_bytes(), &mut recorder).unwrap();

    assert_eq!(interchanges, 2);
    assert_eq!(count(&recorder, "interchange"), 2);
    assert!(recorder.texts().contains(&"PO4712"));
}

#[test]
fn test_custom_decimal_sign() {
    let input = ORDERS_INTERCHANGE
        .replace("UNA:+.? '", "UNA:+,? '")
        .replace("QTY+21:12.5'", "QTY+21:12,5'");
    let recorder = parse_interchange(&input, strict()).unwrap();
    assert!(recorder.texts().contains(&"12.5"));
}

#[test]
fn test_escaped_separator_is_decoded() {
    let input = ORDERS_INTERCHANGE.replace("BGM+220+PO4711+9'", "BGM+220+PO?+47?'11+9'");
    let recorder = parse_interchange(&input, strict()).unwrap();
    assert_eq!(recorder.text_of("docNumber"), Some("PO+47'11"));
}

#[test]
fn test_parser_level_delimiters() {
    let input = "UNB+UNOA:1+SENDER+RECEIVER+240131:1200+R1!UNH+1+ORDERS:D:96A:UN!BGM+220+X!UNT+3+1!UNZ+1+R1!";
    let registry = registry();
    let delimiters = Delimiters::new("!", '+', ':').with_escape('?');
    let parser = InterchangeParser::new(&registry, strict()).with_delimiters(delimiters);
    let mut recorder = EventRecorder::new();

    assert_eq!(parser.parse(input.as_bytes(), &mut recorder).unwrap(), 1);
    assert_eq!(recorder.text_of("docNumber"), Some("X"));
}

#[test]
fn test_unknown_service_block_is_passed_over() {
    let input = ORDERS_INTERCHANGE.replace("UNT+12+1'\n", "UNT+12+1'\nUNX+1'\n");
    let recorder = parse_interchange(&input, strict()).unwrap();
    assert!(!recorder.element_names().contains(&"UNX"));
}

#[test]
fn test_unmapped_body_segment_is_skipped_when_tolerated() {
    let input = ORDERS_INTERCHANGE
        .replace("DTM+137:20240131:102'\n", "DTM+137:20240131:102'\nFOO+1'\n")
        .replace("UNT+12+1'", "UNT+13+1'");
    let recorder = parse_interchange(&input, lenient()).unwrap();
    assert!(!recorder.element_names().contains(&"FOO"));
    assert_eq!(count(&recorder, "party"), 2);
    assert_eq!(count(&recorder, "line"), 2);
}

#[test]
fn test_newlines_between_segments_are_ignored() {
    let compact = ORDERS_INTERCHANGE.replace('\n', "");
    let spaced = parse_interchange(ORDERS_INTERCHANGE, strict()).unwrap();
    let flat = parse_interchange(&compact, strict()).unwrap();
    assert_eq!(spaced, flat);
}

#[test]
fn test_value_validation_inside_interchange() {
    let input = invoic_interchange(&["BGM+380+INV1'", "MOA+77:12X'"]);
    parse_interchange(&input, strict()).unwrap();

    let err = parse_error(&input, strict().validate(true));
    assert_eq!(err.code(), ErrorCode::E0303);
    assert_eq!(err.position().map(|p| p.segment), Some(4));
}
