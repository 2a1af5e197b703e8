//! Where raw domain strings come from: a comma separated flag value or a file
//! with one domain per line.

use std::fs;
use std::path::Path;

use thiserror::Error;

/// The domain file could not be read.
#[derive(Debug, Error)]
#[error("failed to read domain file {path}: {source}")]
pub struct InputError {
    path: String,
    source: std::io::Error,
}

/// Splits a flag value such as `foo.co.uk,bar.co.uk`.
pub fn from_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .map(String::from)
        .collect()
}

/// Reads one domain per line, ignoring blank lines and `#` comments.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, InputError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| InputError {
        path: path.display().to_string(),
        source,
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_list() {
        assert_eq!(
            from_list("foo.co.uk, bar.co.uk,,"),
            vec!["foo.co.uk", "bar.co.uk"]
        );
        assert!(from_list("").is_empty());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# fleet").unwrap();
        writeln!(file, "example.com").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  \"https://example.org/\",  ").unwrap();

        let domains = from_file(file.path()).unwrap();
        assert_eq!(domains, vec!["example.com", "\"https://example.org/\","]);
    }

    #[test]
    fn test_from_missing_file() {
        let err = from_file("/nonexistent/domains.txt").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/domains.txt"));
    }
}
