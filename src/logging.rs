//! Logger setup.
//!
//! Logs go to stderr so that the report on stdout stays machine-readable.

use std::io::Write;

use log::{LevelFilter, SetLoggerError};

/// Installs an `env_logger` at `level`. `RUST_LOG`, when set, takes
/// precedence over `level`.
pub fn init_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] {}: {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    // try_init so tests that install a logger more than once do not panic
    builder.try_init()
}
