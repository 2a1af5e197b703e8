//! Runs the validator over a list of domains on a bounded worker pool.

use log::{debug, info};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::domain::{normalize, www_variant};
use crate::error::CheckError;
use crate::record::ValidationRecord;
use crate::validator::Verifier;

/// Number of concurrent validations used when none is configured.
pub const DEFAULT_WORKERS: usize = 8;

/// Validates many domains with one [`Verifier`].
#[derive(Clone)]
pub struct Checker {
    verifier: Verifier,
    workers: usize,
    check_www: bool,
}

impl Checker {
    pub fn new(verifier: Verifier) -> Checker {
        Checker {
            verifier,
            workers: DEFAULT_WORKERS,
            check_www: false,
        }
    }

    /// Maximum number of connections open at once. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Also probe `www.<domain>`, reporting it only when it is invalid.
    pub fn with_www_variants(mut self, check_www: bool) -> Self {
        self.check_www = check_www;
        self
    }

    /// Normalizes and validates every raw domain.
    ///
    /// Records come back in input order. Inputs that normalize to an empty
    /// string are skipped; if nothing is left, [`CheckError::NoDomains`] is
    /// returned. Individual validation failures never abort the run.
    pub fn run<S: AsRef<str>>(
        &self,
        raw_domains: &[S],
    ) -> Result<Vec<ValidationRecord>, CheckError> {
        let domains = normalize_all(raw_domains);
        if domains.is_empty() {
            return Err(CheckError::NoDomains);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers.min(domains.len()))
            .thread_name(|i| format!("certcheck-worker-{}", i))
            .build()?;
        info!(
            "checking {} domain(s) with {} worker(s)",
            domains.len(),
            pool.current_num_threads()
        );

        let per_domain: Vec<Vec<ValidationRecord>> = pool.install(|| {
            domains
                .par_iter()
                .map(|domain| self.check_domain(domain))
                .collect()
        });
        Ok(per_domain.into_iter().flatten().collect())
    }

    fn check_domain(&self, domain: &str) -> Vec<ValidationRecord> {
        let mut records = vec![self.verifier.validate(domain)];
        if self.check_www {
            let www = self.verifier.validate(&www_variant(domain));
            if www.is_valid() {
                debug!("{}: valid, not reported", www.domain());
            } else {
                records.push(www);
            }
        }
        records
    }
}

fn normalize_all<S: AsRef<str>>(raw_domains: &[S]) -> Vec<String> {
    raw_domains
        .iter()
        .filter_map(|raw| {
            let domain = normalize(raw.as_ref());
            if domain.is_empty() {
                debug!("skipping empty domain input {:?}", raw.as_ref());
                None
            } else {
                Some(domain)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_all_skips_empty_inputs() {
        let raw = ["https://example.com/", "  ", "\"\"", "www.example.org"];
        assert_eq!(normalize_all(&raw), vec!["example.com", "example.org"]);
    }

    #[test]
    fn test_run_without_domains_fails() {
        let verifier = Verifier::new(&Default::default()).unwrap();
        let checker = Checker::new(verifier);
        let raw: [&str; 2] = ["", "/"];
        assert!(matches!(checker.run(&raw), Err(CheckError::NoDomains)));
    }

    #[test]
    fn test_zero_workers_is_clamped() {
        let verifier = Verifier::new(&Default::default()).unwrap();
        let checker = Checker::new(verifier).with_workers(0);
        assert_eq!(checker.workers, 1);
    }
}
