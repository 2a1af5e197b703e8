//! The per-domain validation record and the certificate summaries it holds.

use chrono::{DateTime, Utc};
use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::x509::{X509NameRef, X509Ref};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Go-style RFC 1123 layout used for the report's expiry column.
pub const RFC1123: &str = "%a, %d %b %Y %H:%M:%S UTC";

/// Outcome of validating a single domain.
///
/// Created when validation of a domain starts and only mutated by the
/// [`Verifier`](crate::Verifier) during that pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRecord {
    domain: String,
    valid: bool,
    expiry: Option<DateTime<Utc>>,
    certificate_chain: Vec<PeerCertificate>,
    notes: Vec<String>,
    checked_at: DateTime<Utc>,
}

impl ValidationRecord {
    pub(crate) fn new(domain: &str, checked_at: DateTime<Utc>) -> ValidationRecord {
        ValidationRecord {
            domain: domain.to_string(),
            valid: false,
            expiry: None,
            certificate_chain: Vec::new(),
            notes: Vec::new(),
            checked_at,
        }
    }

    /// Normalized hostname this record is about.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// True only when the handshake, hostname and expiry checks all passed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// notAfter of the leaf certificate, if a chain was captured.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    /// Peer certificates, leaf first.
    pub fn certificate_chain(&self) -> &[PeerCertificate] {
        &self.certificate_chain
    }

    /// Leaf certificate, if a chain was captured.
    pub fn leaf(&self) -> Option<&PeerCertificate> {
        self.certificate_chain.first()
    }

    /// Issuer DN of the leaf, empty without a chain.
    pub fn issuer(&self) -> &str {
        self.leaf().map(|cert| cert.issuer.as_str()).unwrap_or("")
    }

    /// Diagnostics in the order they were recorded.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Time the expiry was evaluated against.
    pub fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    /// Seconds until the leaf expires, negative once expired.
    pub fn seconds_before_expiry(&self) -> Option<i64> {
        self.expiry
            .map(|expiry| (expiry - self.checked_at).num_seconds())
    }

    pub(crate) fn fail(&mut self, error: &ValidationError) {
        self.valid = false;
        self.notes.push(error.to_string());
    }

    pub(crate) fn set_chain(&mut self, chain: Vec<PeerCertificate>) {
        self.expiry = chain.first().map(|leaf| leaf.not_after);
        self.certificate_chain = chain;
    }

    /// Marks the record valid if no failure was recorded.
    pub(crate) fn conclude(&mut self) {
        self.valid = self.notes.is_empty()
            && self
                .expiry
                .is_some_and(|expiry| expiry > self.checked_at);
        if !self.valid && self.notes.is_empty() {
            self.notes.push("certificate could not be validated".to_string());
        }
    }
}

/// Summary of one certificate from the peer chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerCertificate {
    /// Subject distinguished name
    pub subject: String,
    /// Issuer distinguished name
    pub issuer: String,
    /// Serial number, upper-case hex
    pub serial_number: String,
    /// Start of the validity period
    pub not_before: DateTime<Utc>,
    /// End of the validity period
    pub not_after: DateTime<Utc>,
    /// DNS Subject Alternative Names
    pub sans: Vec<String>,
    /// SHA-256 fingerprint, colon separated hex
    pub sha256: String,
}

impl PeerCertificate {
    pub fn from_x509(cert: &X509Ref) -> Result<PeerCertificate, ErrorStack> {
        let sans = cert
            .subject_alt_names()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| name.dnsname().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        let fingerprint = cert.digest(MessageDigest::sha256())?;

        Ok(PeerCertificate {
            subject: distinguished_name(cert.subject_name()),
            issuer: distinguished_name(cert.issuer_name()),
            serial_number: cert.serial_number().to_bn()?.to_hex_str()?.to_string(),
            not_before: to_datetime(cert.not_before())?,
            not_after: to_datetime(cert.not_after())?,
            sans,
            sha256: fingerprint
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(":"),
        })
    }
}

/// Converts an ASN.1 time to UTC by diffing it against the Unix epoch.
pub fn to_datetime(time: &Asn1TimeRef) -> Result<DateTime<Utc>, ErrorStack> {
    let diff = Asn1Time::from_unix(0)?.diff(time)?;
    let secs = i64::from(diff.days) * 86_400 + i64::from(diff.secs);
    Ok(DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH))
}

/// Renders a name RFC 2253 style, most specific attribute first
/// (`CN=R3,O=Let's Encrypt,C=US`).
pub fn distinguished_name(name: &X509NameRef) -> String {
    let mut parts: Vec<String> = name
        .entries()
        .map(|entry| {
            let key = entry.object().nid().short_name().unwrap_or("UNKNOWN");
            let value = entry
                .data()
                .as_utf8()
                .map(|s| escape_dn_value(&s))
                .unwrap_or_default();
            format!("{}={}", key, value)
        })
        .collect();
    parts.reverse();
    parts.join(",")
}

fn escape_dn_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let leading = i == 0 && (c == '#' || c == ' ');
        let trailing = i == last && c == ' ';
        if leading || trailing || matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use openssl::x509::X509NameBuilder;

    fn leaf(not_after: DateTime<Utc>) -> PeerCertificate {
        PeerCertificate {
            subject: "CN=example.com".to_string(),
            issuer: "CN=Test CA,O=Example".to_string(),
            serial_number: "01".to_string(),
            not_before: not_after - Duration::days(90),
            not_after,
            sans: vec!["example.com".to_string()],
            sha256: String::new(),
        }
    }

    #[test]
    fn test_new_record_is_empty() {
        let record = ValidationRecord::new("example.com", Utc::now());
        assert_eq!(record.domain(), "example.com");
        assert!(!record.is_valid());
        assert!(record.certificate_chain().is_empty());
        assert!(record.notes().is_empty());
        assert_eq!(record.issuer(), "");
    }

    #[test]
    fn test_conclude_valid() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut record = ValidationRecord::new("example.com", now);
        record.set_chain(vec![leaf(now + Duration::days(30))]);
        record.conclude();
        assert!(record.is_valid());
        assert_eq!(record.expiry(), Some(now + Duration::days(30)));
        assert_eq!(record.issuer(), "CN=Test CA,O=Example");
        assert_eq!(record.seconds_before_expiry(), Some(30 * 86_400));
    }

    #[test]
    fn test_expiry_equal_to_now_is_not_valid() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut record = ValidationRecord::new("example.com", now);
        record.set_chain(vec![leaf(now)]);
        record.conclude();
        assert!(!record.is_valid());
        assert!(!record.notes().is_empty());
    }

    #[test]
    fn test_failure_keeps_notes_in_order() {
        let now = Utc::now();
        let mut record = ValidationRecord::new("example.com", now);
        record.fail(&ValidationError::ExpiredCertificate { expiry: now });
        record.fail(&ValidationError::ExpiredCertificate { expiry: now });
        record.conclude();
        assert!(!record.is_valid());
        assert_eq!(record.notes().len(), 2);
    }

    #[test]
    fn test_distinguished_name_is_reversed_and_escaped() {
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("C", "US").unwrap();
        name.append_entry_by_text("O", "Example, Inc.").unwrap();
        name.append_entry_by_text("CN", "Example CA").unwrap();
        let name = name.build();
        assert_eq!(
            distinguished_name(&name),
            "CN=Example CA,O=Example\\, Inc.,C=US"
        );
    }

    #[test]
    fn test_to_datetime() {
        let time = Asn1Time::from_unix(1_136_214_245).unwrap();
        assert_eq!(
            to_datetime(&time).unwrap(),
            Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap()
        );
    }
}
