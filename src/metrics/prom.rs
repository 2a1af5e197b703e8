use lazy_static::lazy_static;
use log::{debug, warn};
use prometheus::{labels, register_gauge, Gauge};

use certcheck::ValidationRecord;

lazy_static! {
    static ref CERTCHECK_VALID: Gauge =
        register_gauge!("certcheck_valid", "1 when the certificate passed every check").unwrap();
    static ref CERTCHECK_SECONDS_BEFORE_EXPIRY: Gauge = register_gauge!(
        "certcheck_seconds_before_expiry",
        "seconds until the leaf certificate expires"
    )
    .unwrap();
}

/// Function to push metrics to prometheus
/// # Arguments
/// * `records` - validation records of this run
/// * `prometheus_address` - push gateway base address; `/metrics/job/<job>` is appended
pub fn prometheus_metrics(records: &[ValidationRecord], prometheus_address: &str) {
    for record in records {
        let issuer = match record.issuer() {
            "" => "none",
            issuer => issuer,
        };
        CERTCHECK_VALID.set(if record.is_valid() { 1.0 } else { 0.0 });
        // records without a certificate keep the gauge at zero
        CERTCHECK_SECONDS_BEFORE_EXPIRY.set(record.seconds_before_expiry().unwrap_or(0) as f64);

        let metric_families = prometheus::gather();
        let pushed = prometheus::push_metrics(
            "certcheck",
            labels! {
                "instance".to_owned() => "certcheck".to_owned(),
                "domain".to_owned() => record.domain().to_owned(),
                "issuer".to_owned() => issuer.to_owned(),
                "valid".to_owned() => record.is_valid().to_string(),
            },
            prometheus_address,
            metric_families,
            None,
        );

        match pushed {
            Ok(_) => debug!("pushed metrics for {}", record.domain()),
            Err(e) => warn!("failed to push metrics to prometheus: {}", e),
        }
    }
}
