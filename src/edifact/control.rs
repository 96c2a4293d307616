//! Built-in grammars for the UN/EDIFACT service segments
//!
//! Interchange, group and message headers and trailers are decoded with the
//! same [`SegmentDecoder`](crate::parser::SegmentDecoder) as message bodies,
//! against the fixed grammars defined here.

use std::sync::LazyLock;

use crate::model::{Component, Field, NodeBuilder, Segment};

pub const UNA: &str = "UNA";
pub const UNB: &str = "UNB";
pub const UNG: &str = "UNG";
pub const UNH: &str = "UNH";
pub const UNT: &str = "UNT";
pub const UNE: &str = "UNE";
pub const UNZ: &str = "UNZ";

/// Codes that end a message body.
pub const BODY_TERMINATORS: &[&str] = &[UNT, UNE, UNZ, UNH, UNG, UNB];

/// Length of the service string advice, code included.
pub const UNA_LENGTH: usize = 9;

/// The service segment grammars.
#[derive(Debug)]
pub struct ControlSegments {
    pub unb: Segment,
    pub ung: Segment,
    pub unh: Segment,
    pub unt: Segment,
    pub une: Segment,
    pub unz: Segment,
}

static CONTROL_SEGMENTS: LazyLock<ControlSegments> = LazyLock::new(ControlSegments::build);

/// Shared instance of the service segment grammars.
pub fn control_segments() -> &'static ControlSegments {
    &CONTROL_SEGMENTS
}

fn leaf(name: &str) -> Component {
    Component::new(name)
}

fn simple(name: &str) -> Field {
    Field::new(name)
}

fn date_time() -> Field {
    Field::new("dateTime")
        .component(leaf("date"))
        .component(leaf("time"))
}

fn party(name: &str) -> Field {
    Field::new(name)
        .required()
        .component(leaf("id").required())
        .component(leaf("codeQualifier"))
        .component(leaf("internalId"))
        .component(leaf("internalSubId"))
}

fn application(name: &str) -> Field {
    Field::new(name)
        .component(leaf("id"))
        .component(leaf("codeQualifier"))
}

impl ControlSegments {
    fn build() -> Self {
        let unb = Segment::new(UNB, "interchangeHeader")
            .xml_tag(UNB)
            .truncatable()
            .field(
                Field::new("syntaxIdentifier")
                    .required()
                    .component(leaf("id").required())
                    .component(leaf("versionNum").required())
                    .component(leaf("serviceCodeListDirVersion"))
                    .component(leaf("charEncoding")),
            )
            .field(party("sender"))
            .field(party("recipient"))
            .field(date_time().required())
            .field(simple("controlRef"))
            .field(
                Field::new("recipientRef")
                    .component(leaf("ref"))
                    .component(leaf("refQualifier")),
            )
            .field(simple("applicationRef"))
            .field(simple("processingPriorityCode"))
            .field(simple("ackRequest"))
            .field(simple("agreementId"))
            .field(simple("testIndicator"));

        let ung = Segment::new(UNG, "groupHeader")
            .xml_tag(UNG)
            .truncatable()
            .field(simple("groupId"))
            .field(application("senderApp"))
            .field(application("recipientApp"))
            .field(date_time())
            .field(simple("groupRef"))
            .field(simple("controllingAgencyCode"))
            .field(
                Field::new("messageVersion")
                    .component(leaf("versionNum"))
                    .component(leaf("releaseNum"))
                    .component(leaf("associationCode")),
            )
            .field(simple("applicationPassword"));

        let unh = Segment::new(UNH, "messageHeader")
            .xml_tag(UNH)
            .truncatable()
            .field(simple("messageRef"))
            .field(
                Field::new("messageIdentifier")
                    .component(leaf("type"))
                    .component(leaf("version").required())
                    .component(leaf("release").required())
                    .component(leaf("controllingAgencyCode"))
                    .component(leaf("associationAssignedCode"))
                    .component(leaf("codeListDirVersion"))
                    .component(leaf("typeSubFunctionId")),
            )
            .field(simple("commonAccessRef"))
            .field(
                Field::new("transferStatus")
                    .component(leaf("sequence"))
                    .component(leaf("firstAndLast")),
            );

        let unt = Segment::new(UNT, "messageTrailer")
            .xml_tag(UNT)
            .field(simple("segmentCount"))
            .field(simple("messageRef"));

        let une = Segment::new(UNE, "groupTrailer")
            .xml_tag(UNE)
            .field(simple("groupCount"))
            .field(simple("groupRef"));

        let unz = Segment::new(UNZ, "interchangeTrailer")
            .xml_tag(UNZ)
            .field(simple("controlCount"))
            .field(simple("controlRef"));

        Self {
            unb,
            ung,
            unh,
            unt,
            une,
            unz,
        }
    }
}

/// Encoding name for a UNB syntax identifier.
///
/// Returns `None` for identifiers outside the table. Only the ASCII,
/// ISO-8859-1 and UTF-8 names resolve to a [`Charset`](crate::base::Charset);
/// UNOD to UNOK name encodings the reader cannot decode, and the envelope
/// keeps the current charset for them after logging the name.
pub fn syntax_encoding(syntax_id: &str) -> Option<&'static str> {
    let encoding = match syntax_id {
        "UNOA" | "UNOB" => "US-ASCII",
        "UNOC" => "ISO-8859-1",
        "UNOD" => "ISO-8859-2",
        "UNOE" => "ISO-8859-5",
        "UNOF" => "ISO-8859-7",
        "UNOG" => "ISO-8859-3",
        "UNOH" => "ISO-8859-4",
        "UNOI" => "ISO-8859-6",
        "UNOJ" => "ISO-8859-8",
        "UNOK" => "ISO-8859-9",
        "UNOW" | "UNOY" => "UTF-8",
        _ => return None,
    };
    Some(encoding)
}
