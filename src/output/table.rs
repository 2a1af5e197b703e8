//! Summary table for interactive use.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use crate::output::format_expiry;
use crate::record::ValidationRecord;

pub fn render(records: &[ValidationRecord]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Domain",
            "Valid",
            "Expiry",
            "Days Left",
            "SSL Issuer",
            "Notes",
        ]);

    for record in records {
        let status = if record.is_valid() {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::Red)
        };
        let days_left = record
            .seconds_before_expiry()
            .map(|secs| (secs / 86_400).to_string())
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(record.domain()),
            status,
            Cell::new(format_expiry(record)),
            Cell::new(days_left),
            Cell::new(record.issuer()),
            Cell::new(record.notes().join("\n")),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::sample_records;

    #[test]
    fn test_table_lists_every_domain() {
        let out = render(&sample_records());
        assert!(out.contains("Domain"));
        assert!(out.contains("example.com"));
        assert!(out.contains("bad.invalid"));
        // 2025-01-01 to 2025-03-01 12:00
        assert!(out.contains("59"));
    }
}
