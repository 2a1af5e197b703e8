//! TLS certificate validation for a single domain.
//!
//! A [`Verifier`] owns a configured OpenSSL connector (trust roots, minimum
//! protocol version) plus the connection parameters, and turns a hostname into
//! a [`ValidationRecord`]:
//!
//! 1. handshake with `host:port`, trusting only the configured roots,
//! 2. hostname verification of the leaf,
//! 3. capture of the peer chain,
//! 4. expiry of the leaf against the evaluation time.
//!
//! The first failing step is recorded as a note and the remaining steps are
//! skipped. Certificate time checks are switched off inside the handshake so
//! that an expired but otherwise trusted certificate is reported as expired
//! rather than as a handshake failure.

use std::fs;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use openssl::error::ErrorStack;
use openssl::ssl::{SslConnector, SslMethod, SslRef, SslStream, SslVersion};
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::verify::X509VerifyFlags;
use openssl::x509::X509;

use crate::error::{CheckError, ConnectionError, ValidationError};
use crate::hostname::CertNames;
use crate::record::{PeerCertificate, ValidationRecord};

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 443;

/// Connect, read and write timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Well-known CA bundle file paths, tried when probing finds nothing.
const KNOWN_CA_BUNDLE_PATHS: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt", // Debian/Ubuntu
    "/etc/pki/tls/certs/ca-bundle.crt",   // RHEL/CentOS/Fedora
    "/etc/ssl/ca-bundle.pem",             // openSUSE
    "/etc/ssl/cert.pem",                  // macOS, Alpine
];

/// Certificates the verifier accepts as chain anchors.
#[derive(Clone, Default)]
pub enum TrustRoots {
    /// The platform trust store
    #[default]
    System,
    /// Only the given CA certificates
    Custom(Vec<X509>),
}

impl TrustRoots {
    /// Loads every certificate of a PEM bundle as a custom root.
    pub fn from_pem_file<P: AsRef<Path>>(path: P) -> Result<TrustRoots, CheckError> {
        let path = path.as_ref();
        let load_error = |reason: String| CheckError::TrustRoots {
            path: path.display().to_string(),
            reason,
        };

        let pem = fs::read(path).map_err(|e| load_error(e.to_string()))?;
        let certs = X509::stack_from_pem(&pem).map_err(|e| load_error(e.to_string()))?;
        if certs.is_empty() {
            return Err(load_error("no certificates found".to_string()));
        }
        Ok(TrustRoots::Custom(certs))
    }
}

/// Checks the certificate a host presents.
///
/// Cheap to clone and safe to share between worker threads; every call to
/// [`validate`](Verifier::validate) opens its own connection.
#[derive(Clone)]
pub struct Verifier {
    connector: SslConnector,
    port: u16,
    timeout: Duration,
    connect_to: Option<SocketAddr>,
}

impl Verifier {
    /// Creates a verifier anchored at `roots`, dialing port 443.
    pub fn new(roots: &TrustRoots) -> Result<Verifier, ErrorStack> {
        Ok(Verifier {
            connector: build_connector(roots)?,
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            connect_to: None,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Dials `addr` instead of resolving the hostname. SNI and hostname
    /// verification still use the requested name.
    pub fn connect_to(mut self, addr: SocketAddr) -> Self {
        self.connect_to = Some(addr);
        self
    }

    /// Validates `hostname` against the current time.
    pub fn validate(&self, hostname: &str) -> ValidationRecord {
        self.validate_at(hostname, Utc::now())
    }

    /// Validates `hostname`, judging expiry against `now`.
    pub fn validate_at(&self, hostname: &str, now: DateTime<Utc>) -> ValidationRecord {
        let mut record = ValidationRecord::new(hostname, now);
        if let Err(e) = self.check(hostname, now, &mut record) {
            warn!("{}: {}", hostname, e);
            record.fail(&e);
        }
        record.conclude();

        info!(
            "{}: valid={} chain={} expiry={}",
            hostname,
            record.is_valid(),
            record.certificate_chain().len(),
            record
                .expiry()
                .map(|expiry| expiry.to_rfc3339())
                .unwrap_or_else(|| "-".to_string())
        );
        record
    }

    fn check(
        &self,
        hostname: &str,
        now: DateTime<Utc>,
        record: &mut ValidationRecord,
    ) -> Result<(), ValidationError> {
        let connection = self.connect(hostname)?;
        debug!("{}: handshake completed", hostname);

        let leaf = connection
            .ssl()
            .peer_certificate()
            .ok_or(ConnectionError::NoPeerCertificate)?;
        CertNames::from_x509(&leaf).verify(hostname)?;
        debug!("{}: hostname verified", hostname);

        let chain = match connection.ssl().peer_cert_chain() {
            Some(stack) => stack
                .iter()
                .map(PeerCertificate::from_x509)
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![PeerCertificate::from_x509(&leaf)?],
        };
        record.set_chain(chain);

        if let Some(expiry) = record.expiry() {
            if now >= expiry {
                return Err(ValidationError::ExpiredCertificate { expiry });
            }
        }
        Ok(())
    }

    fn connect(&self, hostname: &str) -> Result<Connection, ConnectionError> {
        let address = format!("{}:{}", hostname, self.port);
        let candidates: Vec<SocketAddr> = match self.connect_to {
            Some(addr) => vec![addr],
            None => (hostname, self.port)
                .to_socket_addrs()
                .map_err(|source| ConnectionError::DnsResolution {
                    hostname: hostname.to_string(),
                    source,
                })?
                .collect(),
        };
        if candidates.is_empty() {
            return Err(ConnectionError::NoAddress {
                hostname: hostname.to_string(),
            });
        }

        let tcp = self
            .dial(&candidates)
            .and_then(|tcp| {
                tcp.set_read_timeout(Some(self.timeout))?;
                tcp.set_write_timeout(Some(self.timeout))?;
                Ok(tcp)
            })
            .map_err(|source| ConnectionError::ConnectionFailed { address, source })?;

        let stream = self
            .connector
            .configure()?
            .verify_hostname(false)
            .connect(hostname, tcp)?;
        Ok(Connection { stream })
    }

    /// Connects to the first reachable candidate address.
    fn dial(&self, candidates: &[SocketAddr]) -> io::Result<TcpStream> {
        let mut last_error = None;
        for addr in candidates {
            match TcpStream::connect_timeout(addr, self.timeout) {
                Ok(tcp) => return Ok(tcp),
                Err(e) => {
                    debug!("dial {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address to dial")))
    }
}

/// An established TLS session.
///
/// Dropping it sends close_notify and closes the socket, so the connection is
/// released on every path out of the validation.
struct Connection {
    stream: SslStream<TcpStream>,
}

impl Connection {
    fn ssl(&self) -> &SslRef {
        self.stream.ssl()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(e) = self.stream.shutdown() {
            debug!("TLS shutdown: {}", e);
        }
    }
}

fn build_connector(roots: &TrustRoots) -> Result<SslConnector, ErrorStack> {
    let mut builder = SslConnector::builder(SslMethod::tls())?;
    builder.set_min_proto_version(Some(SslVersion::TLS1_2))?;

    match roots {
        TrustRoots::System => load_system_roots(&mut builder),
        TrustRoots::Custom(certs) => {
            let mut store = X509StoreBuilder::new()?;
            for cert in certs {
                store.add_cert(cert.clone())?;
            }
            builder.set_cert_store(store.build());
        }
    }

    // Expiry is judged after the handshake against the evaluation time.
    builder
        .verify_param_mut()
        .set_flags(X509VerifyFlags::NO_CHECK_TIME)?;
    Ok(builder.build())
}

/// Adds the platform CA bundle on top of OpenSSL's compiled-in default paths,
/// which do not point at the system store in vendored builds.
fn load_system_roots(builder: &mut openssl::ssl::SslConnectorBuilder) {
    let probe = openssl_probe::probe();
    let candidates = std::env::var_os("SSL_CERT_FILE")
        .map(std::path::PathBuf::from)
        .into_iter()
        .chain(probe.cert_file)
        .chain(KNOWN_CA_BUNDLE_PATHS.iter().map(std::path::PathBuf::from));

    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match builder.set_ca_file(&path) {
            Ok(()) => {
                debug!("loaded trust roots from {}", path.display());
                return;
            }
            Err(e) => debug!("skipping CA bundle {}: {}", path.display(), e),
        }
    }
    warn!("no system CA bundle found, relying on OpenSSL default paths");
}
