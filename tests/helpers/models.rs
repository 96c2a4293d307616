//! Mapping models used across the integration tests.

use edistream::Delimiters;
use edistream::model::{
    Component, DataType, Description, Edimap, Field, NodeBuilder, Occurs, Segment, SegmentGroup,
};

pub const ORDERS_NS: &str = "urn:test:orders";
pub const INVOIC_NS: &str = "urn:test:invoic";

fn composite(name: &str, parts: &[&str]) -> Field {
    parts
        .iter()
        .fold(Field::new(name), |field, part| field.component(Component::new(*part)))
}

/// A cut-down purchase order:
///
/// ```text
/// Order
/// ├── BGM header (required)
/// ├── DTM date (0..5)
/// ├── party (0..*)
/// │   ├── NAD nameAddress (required)
/// │   └── CTA contact
/// ├── line (0..*)
/// │   ├── LIN item (required)
/// │   └── QTY quantity (0..3)
/// └── CNT controlTotal
/// ```
pub fn orders() -> Edimap {
    let root = SegmentGroup::new("Order")
        .segment(
            Segment::new("BGM", "header")
                .required()
                .truncatable()
                .field(
                    Field::new("docName")
                        .truncatable()
                        .component(Component::new("code").required())
                        .component(Component::new("agency")),
                )
                .field(Field::new("docNumber"))
                .field(Field::new("function")),
        )
        .segment(
            Segment::new("DTM", "date")
                .max_occurs(Occurs::Bounded(5))
                .field(
                    Field::new("dateTime")
                        .required()
                        .component(Component::new("qualifier").required())
                        .component(Component::new("value"))
                        .component(Component::new("format").data_type(DataType::Numeric)),
                ),
        )
        .group(
            SegmentGroup::new("party")
                .max_occurs(Occurs::Unbounded)
                .segment(
                    Segment::new("NAD", "nameAddress")
                        .required()
                        .truncatable()
                        .field(Field::new("qualifier").required())
                        .field(composite("partyId", &["id", "codeList", "agency"])),
                )
                .segment(
                    Segment::new("CTA", "contact")
                        .truncatable()
                        .field(Field::new("function"))
                        .field(composite("department", &["id", "name"])),
                ),
        )
        .group(
            SegmentGroup::new("line")
                .max_occurs(Occurs::Unbounded)
                .segment(
                    Segment::new("LIN", "item")
                        .required()
                        .truncatable()
                        .field(Field::new("lineNumber").required().data_type(DataType::Numeric))
                        .field(Field::new("action"))
                        .field(composite("itemId", &["id", "type"])),
                )
                .segment(
                    Segment::new("QTY", "quantity")
                        .max_occurs(Occurs::Bounded(3))
                        .field(
                            Field::new("quantity")
                                .required()
                                .component(Component::new("qualifier").required())
                                .component(Component::new("amount").data_type(DataType::Decimal)),
                        ),
                ),
        )
        .segment(
            Segment::new("CNT", "controlTotal")
                .field(composite("control", &["qualifier", "value"])),
        );

    Edimap::new(
        Description::new("ORDERS", "D:96A", ORDERS_NS).with_prefix("ord"),
        Delimiters::edifact(),
        root,
    )
}

/// An invoice with a single free-text segment that repeats its text field.
pub fn invoic() -> Edimap {
    let root = SegmentGroup::new("Invoice")
        .segment(
            Segment::new("BGM", "header")
                .required()
                .truncatable()
                .field(Field::new("docName"))
                .field(Field::new("docNumber").required().length(Some(1), Some(10))),
        )
        .segment(
            Segment::new("FTX", "freeText")
                .max_occurs(Occurs::Bounded(9))
                .field(Field::new("subject").required())
                .field(Field::new("text").max_occurs(Occurs::Bounded(5))),
        )
        .segment(
            Segment::new("MOA", "amount")
                .field(
                    Field::new("monetaryAmount")
                        .required()
                        .component(Component::new("qualifier").required())
                        .component(Component::new("value").data_type(DataType::Decimal)),
                ),
        );

    Edimap::new(
        Description::new("INVOIC", "D:01B", INVOIC_NS),
        Delimiters::edifact(),
        root,
    )
}
