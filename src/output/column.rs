//! Column report: one labeled block per domain.

use std::fmt::Write;

use crate::output::format_expiry;
use crate::record::ValidationRecord;

pub fn render(records: &[ValidationRecord]) -> String {
    let mut out = String::new();
    for record in records {
        // writing to a String cannot fail
        let _ = write!(
            out,
            "\n\nDomain:\t\t{}\nValid:\t\t{}\nExpiry:\t\t{}\nSSL Issuer:\t{}\nNotes:",
            record.domain(),
            record.is_valid(),
            format_expiry(record),
            record.issuer()
        );
        if record.notes().is_empty() {
            out.push('\n');
        }
        for note in record.notes() {
            let _ = writeln!(out, "\t\t{}", note);
        }
    }
    out
}
