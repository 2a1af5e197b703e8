//! Domain normalization.
//!
//! Operators paste domains from browsers, spreadsheets and CSV exports, so the
//! raw input frequently carries a scheme, a `www.` label, a trailing slash or
//! quoting. [`normalize`] reduces all of that to a bare hostname that can be
//! handed to the TLS connector.

/// Substrings removed from the raw input, in order.
const STRIPPED: [&str; 7] = ["https://", "http://", "www.", "/", "\"", "'", ","];

/// Reduces a raw domain string to a bare hostname.
///
/// Every occurrence of `https://`, `http://`, `www.`, `/`, quote characters
/// and commas is removed, as is surrounding whitespace. The function performs
/// no network access and is idempotent.
///
/// # Example
///
/// ```
/// # use certcheck::domain::normalize;
/// assert_eq!(normalize(" https://www.example.com/ "), "example.com");
/// ```
pub fn normalize(raw: &str) -> String {
    let mut host = raw.trim().to_string();
    // Removing one pattern can splice another together ("wwwww.w." -> "www."),
    // so repeat until nothing changes.
    loop {
        let before = host.len();
        for pattern in STRIPPED {
            host = host.replace(pattern, "");
        }
        host = host.trim().to_string();
        if host.len() == before {
            return host;
        }
    }
}

/// Returns the `www.` prefixed variant of an already normalized host.
pub fn www_variant(host: &str) -> String {
    format!("www.{}", host)
}
