//! Indexing failure-rate tracking.

use std::collections::VecDeque;
use std::sync::Mutex;

const WINDOW_CAPACITY: usize = 20;

/// Sliding window over the most recent indexing outcomes.
///
/// Once the window holds `WINDOW_CAPACITY` attempts, a failure count
/// strictly above half the window escalates the job to failed; with fewer
/// attempts recorded the job always continues.
#[derive(Debug, Default)]
pub struct FailureWindow {
    outcomes: Mutex<VecDeque<bool>>,
}

impl FailureWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one indexing outcome; returns `true` when the failure rate
    /// now exceeds the threshold.
    pub fn record(&self, success: bool) -> bool {
        let mut outcomes = self.outcomes.lock().expect("failure window lock");
        if outcomes.len() == WINDOW_CAPACITY {
            outcomes.pop_front();
        }
        outcomes.push_back(success);

        if outcomes.len() < WINDOW_CAPACITY {
            return false;
        }
        let failures = outcomes.iter().filter(|ok| !**ok).count();
        failures > WINDOW_CAPACITY / 2
    }
}
