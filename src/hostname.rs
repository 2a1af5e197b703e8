//! Hostname verification against a leaf certificate.
//!
//! The TLS handshake only establishes that the peer chain is trusted; whether
//! the certificate actually covers the requested host is decided here, using
//! the usual client rules: Subject Alternative Names take precedence, the
//! subject Common Name is consulted only when the certificate carries no SAN
//! names, and a wildcard may only stand for the whole left-most label.

use std::fmt;
use std::net::IpAddr;

use openssl::nid::Nid;
use openssl::x509::X509Ref;

/// Names a certificate is issued for.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CertNames {
    /// SAN dNSName entries
    pub dns: Vec<String>,
    /// SAN iPAddress entries
    pub ips: Vec<IpAddr>,
    /// Subject Common Name, if any
    pub common_name: Option<String>,
}

impl CertNames {
    /// Collects the SAN entries and subject CN of `cert`.
    pub fn from_x509(cert: &X509Ref) -> CertNames {
        let mut names = CertNames::default();
        if let Some(sans) = cert.subject_alt_names() {
            for san in sans.iter() {
                if let Some(dns) = san.dnsname() {
                    names.dns.push(dns.to_string());
                } else if let Some(ip) = san.ipaddress().and_then(ip_from_bytes) {
                    names.ips.push(ip);
                }
            }
        }
        names.common_name = cert
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .and_then(|entry| entry.data().as_utf8().ok())
            .map(|cn| cn.to_string());
        names
    }

    fn has_san(&self) -> bool {
        !self.dns.is_empty() || !self.ips.is_empty()
    }

    /// Checks whether these names authorize `host`.
    pub fn verify(&self, host: &str) -> Result<(), HostnameMismatch> {
        let matched = match host.parse::<IpAddr>() {
            Ok(ip) => self.ips.contains(&ip),
            Err(_) if self.has_san() => self.dns.iter().any(|p| matches_pattern(p, host)),
            Err(_) => self
                .common_name
                .as_deref()
                .is_some_and(|cn| matches_pattern(cn, host)),
        };
        if matched {
            return Ok(());
        }

        let mut valid_for: Vec<String> = self.dns.clone();
        valid_for.extend(self.ips.iter().map(IpAddr::to_string));
        if !self.has_san() {
            valid_for.extend(self.common_name.clone());
        }
        Err(HostnameMismatch {
            host: host.to_string(),
            valid_for,
        })
    }
}

/// The certificate does not cover the requested host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnameMismatch {
    /// Host that was requested
    pub host: String,
    /// Names the certificate is valid for
    pub valid_for: Vec<String>,
}

impl fmt::Display for HostnameMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid_for.is_empty() {
            write!(
                f,
                "certificate is not valid for any names, but wanted to match {}",
                self.host
            )
        } else {
            write!(
                f,
                "certificate is valid for {}, not {}",
                self.valid_for.join(", "),
                self.host
            )
        }
    }
}

impl std::error::Error for HostnameMismatch {}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(IpAddr::from),
        16 => <[u8; 16]>::try_from(bytes).ok().map(IpAddr::from),
        _ => None,
    }
}

/// Matches a single certificate name against a host, ignoring ASCII case and
/// a trailing dot on either side.
pub fn matches_pattern(pattern: &str, host: &str) -> bool {
    let pattern = pattern.trim_end_matches('.').to_ascii_lowercase();
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if pattern.is_empty() || host.is_empty() {
        return false;
    }

    let pattern_labels: Vec<&str> = pattern.split('.').collect();
    let host_labels: Vec<&str> = host.split('.').collect();
    if pattern_labels.len() != host_labels.len() {
        return false;
    }

    let wildcard = pattern_labels[0] == "*";
    // "*.com" style patterns would cover a whole public suffix
    if wildcard && pattern_labels.len() < 3 {
        return false;
    }

    pattern_labels
        .iter()
        .zip(host_labels.iter())
        .enumerate()
        .all(|(i, (p, h))| {
            if h.is_empty() {
                return false;
            }
            if i == 0 && wildcard {
                return true;
            }
            p == h
        })
}
