//! URL fingerprinting.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a URL.
///
/// Used both as the stable record ID for extracted documents and as the
/// key for in-flight deduplication, so one URL is indexed at most once per
/// job.
pub fn url_fingerprint(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = url_fingerprint("https://a.test/x");
        let b = url_fingerprint("https://a.test/x");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_distinct_urls_distinct_fingerprints() {
        assert_ne!(
            url_fingerprint("https://a.test/x"),
            url_fingerprint("https://a.test/y")
        );
    }
}
