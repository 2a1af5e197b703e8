//! Error types for certificate validation.
//!
//! Validation failures never escape [`Verifier::validate`](crate::Verifier::validate);
//! they are rendered into the notes of the record. The `Display` output of
//! [`ValidationError`] is exactly the note text an operator sees.

use std::io;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::hostname::HostnameMismatch;

/// Go-style RFC 850 layout used in expiry notes.
pub const RFC850: &str = "%A, %d-%b-%y %H:%M:%S UTC";

/// Why a domain failed validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// No TLS session could be established
    #[error("server does not support SSL certificate: {0}")]
    Connection(#[from] ConnectionError),

    /// The session was established but the certificate is for another name
    #[error("hostname does not match the SSL certificate: {0}")]
    HostnameMismatch(#[from] HostnameMismatch),

    /// The leaf certificate's notAfter lies in the past
    #[error("SSL certificate has expired: {}", .expiry.format(RFC850))]
    ExpiredCertificate {
        /// The leaf's notAfter
        expiry: DateTime<Utc>,
    },
}

/// Transport and TLS negotiation failures.
///
/// Transient and permanent failures are not distinguished; each of these ends
/// up as a single note on the record.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// DNS resolution failed for the given hostname
    #[error("failed to resolve {hostname}: {source}")]
    DnsResolution {
        /// The hostname that failed to resolve
        hostname: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// The hostname resolved to no addresses at all
    #[error("no addresses found for {hostname}")]
    NoAddress {
        /// The hostname that was resolved
        hostname: String,
    },

    /// TCP connection failed to the target address
    #[error("dial tcp {address}: {source}")]
    ConnectionFailed {
        /// The address (host:port) that connection failed to
        address: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TLS handshake failed, including an untrusted peer chain
    #[error("{details}")]
    HandshakeFailed {
        /// Details about why the handshake failed
        details: String,
    },

    /// The peer completed the handshake without sending a certificate
    #[error("peer presented no certificate")]
    NoPeerCertificate,

    /// OpenSSL error while preparing the connection
    #[error("OpenSSL error: {0}")]
    OpenSSL(#[from] openssl::error::ErrorStack),
}

impl<S: std::fmt::Debug> From<openssl::ssl::HandshakeError<S>> for ConnectionError {
    fn from(e: openssl::ssl::HandshakeError<S>) -> Self {
        Self::HandshakeFailed {
            details: e.to_string(),
        }
    }
}

impl From<openssl::error::ErrorStack> for ValidationError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::Connection(ConnectionError::OpenSSL(e))
    }
}

/// Failures that stop a whole run before any domain is checked.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The CA bundle could not be read or parsed
    #[error("failed to load CA bundle {path}: {reason}")]
    TrustRoots {
        /// Path of the bundle
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Worker pool could not be started
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// No domains were left after reading and normalizing the input
    #[error("No domains were specified.")]
    NoDomains,
}
