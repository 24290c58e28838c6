//! In-flight URL deduplication.

use dashmap::DashSet;
use trawler_types::url_fingerprint;

/// Per-job set of URL fingerprints already handed to processing.
///
/// Guarantees at most one indexing attempt per URL per job: the first
/// claim wins, every later claim for the same URL is refused.
#[derive(Debug, Default)]
pub struct InFlightSet {
    fingerprints: DashSet<String>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a URL. Returns `false` when it was already claimed.
    pub fn try_claim(&self, url: &str) -> bool {
        self.fingerprints.insert(url_fingerprint(url))
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}
