//! Configuration file management for certcheck.
//!
//! This module handles loading, parsing, and merging configuration from TOML files
//! and command-line arguments. Settings can be specified in multiple places
//! with clear precedence rules.
//!
//! # Configuration Precedence
//!
//! 1. Default values (lowest priority)
//! 2. Configuration file (certcheck.toml or specified with --config)
//! 3. Command-line arguments (highest priority)
//!
//! # Example Configuration File
//!
//! ```toml
//! domains = ["example.com", "https://www.example.org/"]
//! output = "csv"
//! workers = 8
//! timeout_secs = 30
//! check_www = false
//! exit_code = 1
//!
//! [prometheus]
//! enabled = true
//! address = "http://localhost:9091"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checker::DEFAULT_WORKERS;
use crate::output::OutputFormat;
use crate::validator::{DEFAULT_PORT, DEFAULT_TIMEOUT};

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "certcheck.toml";

/// Main configuration structure for certcheck.
///
/// All fields are optional to support partial configuration and merging.
/// Missing values will be filled in by defaults or overridden by CLI arguments.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Domains to check
    pub domains: Option<Vec<String>>,
    /// File with one domain per line
    pub file: Option<PathBuf>,
    /// Output format; when unset a single domain is shown as a column block
    pub output: Option<OutputFormat>,
    /// Concurrent validations
    pub workers: Option<usize>,
    /// Connect, read and write timeout in seconds
    pub timeout_secs: Option<u64>,
    /// TLS port
    pub port: Option<u16>,
    /// Also report failing www. variants
    pub check_www: Option<bool>,
    /// PEM bundle replacing the system trust store
    pub ca_file: Option<PathBuf>,
    /// Exit code to use when any certificate is invalid
    pub exit_code: Option<i32>,
    /// Prometheus configuration
    pub prometheus: Option<PrometheusConfig>,
}

/// Prometheus integration configuration.
///
/// Controls whether results are pushed to a Prometheus Push Gateway
/// and specifies the gateway address.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct PrometheusConfig {
    /// Enable prometheus metrics pushing
    pub enabled: Option<bool>,
    /// Prometheus push gateway address (e.g., "http://localhost:9091")
    pub address: Option<String>,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use certcheck::config::Config;
    /// let config = Config::from_file("certcheck.toml")?;
    /// # Ok::<(), certcheck::config::ConfigError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Creates a configuration with the built-in defaults.
    ///
    /// `domains`, `file`, `output` and `ca_file` stay unset: there is no
    /// default domain source, the output format depends on how many domains
    /// are checked, and the system trust store is used.
    pub fn defaults() -> Self {
        Config {
            domains: None,
            file: None,
            output: None,
            workers: Some(DEFAULT_WORKERS),
            timeout_secs: Some(DEFAULT_TIMEOUT.as_secs()),
            port: Some(DEFAULT_PORT),
            check_www: Some(false),
            ca_file: None,
            exit_code: Some(0),
            prometheus: Some(PrometheusConfig {
                enabled: Some(false),
                address: Some("http://localhost:9091".to_string()),
            }),
        }
    }

    /// Merges this configuration with another, prioritizing the other's values.
    ///
    /// For each field, if the `other` config has a value (Some), it overrides
    /// this config's value. If the `other` value is None, keeps the current value.
    /// `domains` and `file` form a single domain source: when `other` names
    /// either one, both are taken from `other`.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.domains.is_some() || other.file.is_some() {
            self.domains = other.domains;
            self.file = other.file;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.workers.is_some() {
            self.workers = other.workers;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.check_www.is_some() {
            self.check_www = other.check_www;
        }
        if other.ca_file.is_some() {
            self.ca_file = other.ca_file;
        }
        if other.exit_code.is_some() {
            self.exit_code = other.exit_code;
        }
        if let Some(other_prom) = other.prometheus {
            if let Some(ref mut self_prom) = self.prometheus {
                if other_prom.enabled.is_some() {
                    self_prom.enabled = other_prom.enabled;
                }
                if other_prom.address.is_some() {
                    self_prom.address = other_prom.address;
                }
            } else {
                self.prometheus = Some(other_prom);
            }
        }
        self
    }

    /// Rejects values no run can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == Some(0) {
            return Err(ConfigError::Validation(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.port == Some(0) {
            return Err(ConfigError::Validation("port must not be 0".to_string()));
        }
        if self.prometheus_enabled() && self.prometheus_address().is_none() {
            return Err(ConfigError::Validation(
                "prometheus is enabled but no address is set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn prometheus_enabled(&self) -> bool {
        self.prometheus
            .as_ref()
            .and_then(|prom| prom.enabled)
            .unwrap_or(false)
    }

    pub fn prometheus_address(&self) -> Option<&str> {
        self.prometheus
            .as_ref()
            .and_then(|prom| prom.address.as_deref())
    }

    /// Generates an example configuration file in TOML format.
    ///
    /// # Example
    ///
    /// ```
    /// # use certcheck::config::Config;
    /// let example = Config::example_toml();
    /// println!("{}", example);
    /// ```
    pub fn example_toml() -> String {
        let example = Config {
            domains: Some(vec![
                "example.com".to_string(),
                "https://www.example.org/".to_string(),
                "expired.badssl.com".to_string(),
            ]),
            file: None,
            output: Some(OutputFormat::Csv),
            workers: Some(DEFAULT_WORKERS),
            timeout_secs: Some(DEFAULT_TIMEOUT.as_secs()),
            port: Some(DEFAULT_PORT),
            check_www: Some(false),
            ca_file: None,
            exit_code: Some(1),
            prometheus: Some(PrometheusConfig {
                enabled: Some(false),
                address: Some("http://localhost:9091".to_string()),
            }),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("IO Error: {0}")]
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    #[error("Parse Error: {0}")]
    Parse(String),
    /// Validation error (invalid values)
    #[error("Validation Error: {0}")]
    Validation(String),
}
