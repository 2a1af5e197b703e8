//! Test-only PKI and a local TLS server, so validation can be exercised
//! without live hosts.

#![allow(dead_code)]

use std::io::{self, Read};
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::ssl::{SslAcceptor, SslMethod};
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage,
    SubjectAlternativeName, SubjectKeyIdentifier,
};
use openssl::x509::{X509Name, X509NameBuilder, X509};

pub const CA_NAME: &str = "certcheck test CA";
pub const CA_ISSUER_DN: &str = "CN=certcheck test CA,O=certcheck";

const DAY: i64 = 86_400;

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn name(common_name: &str) -> X509Name {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("O", "certcheck").unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    name.build()
}

fn serial() -> openssl::asn1::Asn1Integer {
    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
    serial.to_asn1_integer().unwrap()
}

/// Validity window of an issued certificate, in days relative to now.
#[derive(Clone, Copy)]
pub struct Validity {
    pub from_days: i64,
    pub to_days: i64,
}

impl Validity {
    pub fn current() -> Validity {
        Validity {
            from_days: -1,
            to_days: 90,
        }
    }

    pub fn expired() -> Validity {
        Validity {
            from_days: -30,
            to_days: -1,
        }
    }
}

pub struct TestCa {
    pub cert: X509,
    key: PKey<Private>,
}

impl TestCa {
    pub fn new() -> TestCa {
        Self::named(CA_NAME)
    }

    pub fn named(common_name: &str) -> TestCa {
        let key = ec_key();
        let name = name(common_name);

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        builder.set_serial_number(&serial()).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::from_unix((now_unix() - DAY) as _).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::from_unix((now_unix() + 365 * DAY) as _).unwrap())
            .unwrap();
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .key_cert_sign()
                    .crl_sign()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let ski = SubjectKeyIdentifier::new()
            .build(&builder.x509v3_context(None, None))
            .unwrap();
        builder.append_extension(ski).unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();

        TestCa {
            cert: builder.build(),
            key,
        }
    }

    /// Issues a server certificate for `dns_names`; the first name is also
    /// the subject CN.
    pub fn issue(&self, dns_names: &[&str], validity: Validity) -> (X509, PKey<Private>) {
        let key = ec_key();
        let now = now_unix();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        builder.set_serial_number(&serial()).unwrap();
        builder.set_subject_name(&name(dns_names[0])).unwrap();
        builder.set_issuer_name(self.cert.subject_name()).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::from_unix((now + validity.from_days * DAY) as _).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::from_unix((now + validity.to_days * DAY) as _).unwrap())
            .unwrap();
        builder
            .append_extension(BasicConstraints::new().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .digital_signature()
                    .key_encipherment()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        builder
            .append_extension(ExtendedKeyUsage::new().server_auth().build().unwrap())
            .unwrap();

        let mut san = SubjectAlternativeName::new();
        for dns in dns_names {
            san.dns(dns);
        }
        let san = san
            .build(&builder.x509v3_context(Some(&*self.cert), None))
            .unwrap();
        builder.append_extension(san).unwrap();
        let aki = AuthorityKeyIdentifier::new()
            .keyid(false)
            .build(&builder.x509v3_context(Some(&*self.cert), None))
            .unwrap();
        builder.append_extension(aki).unwrap();

        builder.sign(&self.key, MessageDigest::sha256()).unwrap();
        (builder.build(), key)
    }
}

fn acceptor(ca: &TestCa, leaf: X509, key: PKey<Private>) -> SslAcceptor {
    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&key).unwrap();
    acceptor.set_certificate(&leaf).unwrap();
    acceptor.add_extra_chain_cert(ca.cert.clone()).unwrap();
    acceptor.check_private_key().unwrap();
    acceptor.build()
}

/// Serves `leaf` (followed by the CA certificate) on an ephemeral localhost
/// port until the test process exits.
pub fn serve(ca: &TestCa, leaf: X509, key: PKey<Private>) -> SocketAddr {
    let acceptor = acceptor(ca, leaf, key);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let acceptor = acceptor.clone();
            thread::spawn(move || {
                // clients that reject the chain abort the handshake
                if let Ok(mut tls) = acceptor.accept(stream) {
                    let mut buf = [0u8; 256];
                    while matches!(tls.read(&mut buf), Ok(n) if n > 0) {}
                }
            });
        }
    });
    addr
}

/// Accepts a single TLS connection and, once the handshake is done, waits for
/// the client to hang up. The handle yields what that read returned: `Ok(0)`
/// when the client closed the session, a timeout error when it kept it open.
pub fn serve_once(
    ca: &TestCa,
    leaf: X509,
    key: PKey<Private>,
) -> (SocketAddr, JoinHandle<io::Result<usize>>) {
    let acceptor = acceptor(ca, leaf, key);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept()?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        let mut tls = acceptor
            .accept(stream)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        let mut buf = [0u8; 256];
        tls.read(&mut buf)
    });
    (addr, handle)
}

/// An address nothing listens on.
pub fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}
