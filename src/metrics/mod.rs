//! Metrics export.
//!
//! Pushes per-domain certificate health to external monitoring systems.
//! Currently supports Prometheus Push Gateway.
//!
//! # Submodules
//!
//! - `prom` - Prometheus metrics integration

pub mod prom;
