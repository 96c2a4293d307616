//! Sample interchanges and message bodies.

/// One ORDERS message with a service string advice, one segment per line.
pub const ORDERS_INTERCHANGE: &str = "\
UNA:+.? '
UNB+UNOA:1+SENDER+RECEIVER+240131:1200+REF42'
UNH+1+ORDERS:D:96A:UN'
BGM+220+PO4711+9'
DTM+137:20240131:102'
NAD+BY+5412345000013::9'
CTA+OC+:ANNE DOE'
NAD+SU+4012345500004::9'
LIN+1++4000862141404:SRS'
QTY+21:48'
LIN+2++4000862141411:SRS'
QTY+21:12.5'
CNT+2:2'
UNT+12+1'
UNZ+1+REF42'
";

/// Two INVOIC messages inside a functional group; UNA declares `*` as the
/// repetition separator.
pub const GROUPED_INTERCHANGE: &str = "\
UNA:+.?*'
UNB+UNOC:3+SENDER+RECEIVER+240131:1200+REF7'
UNG+INVOIC+APP1+APP2+240131:1200+GRP1+UN+D:01B'
UNH+M1+INVOIC:D:01B:UN'
BGM+380+INV001'
FTX+AAI+FIRST LINE*SECOND LINE'
MOA+77:1250.00'
UNT+5+M1'
UNH+M2+INVOIC:D:01B:UN'
BGM+380+INV002'
UNT+3+M2'
UNE+2+GRP1'
UNZ+1+REF7'
";

/// An interchange on the default delimiters, no service string advice.
pub const PLAIN_INTERCHANGE: &str = "\
UNB+UNOA:1+SENDER+RECEIVER+240201:0800+REF43'
UNH+7+ORDERS:D:96A:UN'
BGM+220+PO4712'
UNT+3+7'
UNZ+1+REF43'
";

/// A bare ORDERS body for single-message parsing.
pub const ORDERS_BODY: &str = "\
BGM+220+PO4711+9'
DTM+137:20240131:102'
NAD+BY+5412345000013::9'
LIN+1++4000862141404:SRS'
QTY+21:48'
LIN+2'
QTY+21:3.75'
";

/// Wrap terminated INVOIC body segments in an interchange with a correct
/// trailer count.
pub fn invoic_interchange(body: &[&str]) -> String {
    let mut out = String::from("UNB+UNOA:1+SENDER+RECEIVER+240131:1200+REF9'\nUNH+1+INVOIC:D:01B:UN'\n");
    for segment in body {
        out.push_str(segment);
        out.push('\n');
    }
    out.push_str(&format!("UNT+{}+1'\nUNZ+1+REF9'\n", body.len() + 2));
    out
}
