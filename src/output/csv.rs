//! CSV report.

use crate::output::format_expiry;
use crate::record::ValidationRecord;

const HEADER: [&str; 5] = ["Domain", "Valid", "Expiry", "SSL Issuer", "Notes"];
const SEPARATOR: &str = ",";

/// Renders the header row plus one row per record.
pub fn render(records: &[ValidationRecord]) -> String {
    let mut out = HEADER.join(SEPARATOR);
    out.push('\n');
    for record in records {
        out.push_str(&row(record));
        out.push('\n');
    }
    out
}

/// One CSV row, without the trailing newline.
pub fn row(record: &ValidationRecord) -> String {
    [
        escape(record.domain()),
        record.is_valid().to_string(),
        escape(&format_expiry(record)),
        escape(record.issuer()),
        escape(&record.notes().join("; ")),
    ]
    .join(SEPARATOR)
}

/// Quotes a field RFC 4180 style when it contains a separator, quote or
/// line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
