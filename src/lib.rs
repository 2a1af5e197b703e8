//! Audit the TLS certificates presented by a fleet of domains.
//!
//! Raw domain strings are cleaned up by [`domain::normalize`] and handed to a
//! [`Verifier`], which performs the TLS handshake, verifies the hostname and
//! checks expiry, producing one [`ValidationRecord`] per domain. [`Checker`]
//! runs the verifier over many domains on a bounded worker pool and the
//! [`output`] module renders the records.
//!
//! ```no_run
//! use certcheck::{Checker, TrustRoots, Verifier};
//!
//! let verifier = Verifier::new(&TrustRoots::System)?;
//! let records = Checker::new(verifier).run(&["https://example.com/"])?;
//! for record in &records {
//!     println!("{} valid={}", record.domain(), record.is_valid());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod checker;
pub mod config;
pub mod domain;
pub mod error;
pub mod hostname;
pub mod input;
pub mod logging;
pub mod output;
pub mod record;
pub mod validator;

pub use checker::Checker;
pub use error::{CheckError, ConnectionError, ValidationError};
pub use hostname::HostnameMismatch;
pub use output::OutputFormat;
pub use record::{PeerCertificate, ValidationRecord};
pub use validator::{TrustRoots, Verifier};
