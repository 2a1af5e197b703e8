//! Report rendering.
//!
//! Renderers only consume [`ValidationRecord`] values; none of them feeds
//! anything back into validation.
//!
//! # Submodules
//!
//! - `csv` - `Domain,Valid,Expiry,SSL Issuer,Notes` rows
//! - `column` - one labeled block per domain
//! - `table` - summary table for terminals

pub mod column;
pub mod csv;
pub mod table;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::record::{ValidationRecord, RFC1123};

/// Report format.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Column,
    Json,
    Table,
}

impl OutputFormat {
    /// Picks the format for a run: an explicit choice wins, otherwise a
    /// single domain is shown as a column block and several as CSV.
    pub fn resolve(explicit: Option<OutputFormat>, domains: usize) -> OutputFormat {
        match explicit {
            Some(format) => format,
            None if domains == 1 => OutputFormat::Column,
            None => OutputFormat::Csv,
        }
    }
}

/// Renders `records` in `format`.
pub fn render(
    records: &[ValidationRecord],
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    Ok(match format {
        OutputFormat::Csv => csv::render(records),
        OutputFormat::Column => column::render(records),
        OutputFormat::Json => serde_json::to_string_pretty(records)?,
        OutputFormat::Table => table::render(records),
    })
}

/// Expiry column value; empty when no certificate was captured.
pub(crate) fn format_expiry(record: &ValidationRecord) -> String {
    record
        .expiry()
        .map(|expiry| expiry.format(RFC1123).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) fn sample_records() -> Vec<ValidationRecord> {
    use crate::error::{ConnectionError, ValidationError};
    use crate::record::PeerCertificate;
    use chrono::{Duration, TimeZone, Utc};

    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let not_after = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

    let mut valid = ValidationRecord::new("example.com", now);
    valid.set_chain(vec![PeerCertificate {
        subject: "CN=example.com".to_string(),
        issuer: "CN=Test CA,O=Example\\, Inc.,C=US".to_string(),
        serial_number: "0A".to_string(),
        not_before: not_after - Duration::days(90),
        not_after,
        sans: vec!["example.com".to_string()],
        sha256: "AB:CD".to_string(),
    }]);
    valid.conclude();

    let mut invalid = ValidationRecord::new("bad.invalid", now);
    invalid.fail(&ValidationError::Connection(ConnectionError::NoAddress {
        hostname: "bad.invalid".to_string(),
    }));
    invalid.conclude();

    vec![valid, invalid]
}
