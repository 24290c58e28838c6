//! Per-source request rate limiting.

use rand::Rng;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Token bucket yielding one permit per configured interval plus jitter.
///
/// The interval between two permits is
/// `rate_limit + uniform(0, rate_limit * factor)`, so the observed
/// inter-request gap never falls below `rate_limit`.
pub struct RateLimiter {
    rate_limit: Duration,
    random_delay_factor: f64,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(rate_limit: Duration, random_delay_factor: f64) -> Self {
        Self {
            rate_limit,
            random_delay_factor: random_delay_factor.max(0.0),
            next_slot: Mutex::new(None),
        }
    }

    /// Block until the next request slot opens.
    pub async fn acquire(&self) {
        if self.rate_limit.is_zero() {
            return;
        }
        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(at) if at > now => at,
                _ => now,
            };
            *next_slot = Some(slot + self.interval());
            slot
        };
        tokio::time::sleep_until(slot).await;
    }

    fn interval(&self) -> Duration {
        let jitter = if self.random_delay_factor > 0.0 {
            let scale: f64 = rand::thread_rng().gen_range(0.0..self.random_delay_factor);
            self.rate_limit.mul_f64(scale)
        } else {
            Duration::ZERO
        };
        self.rate_limit + jitter
    }

    pub fn rate_limit(&self) -> Duration {
        self.rate_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_rate_limit_never_blocks() {
        let limiter = RateLimiter::new(Duration::ZERO, 2.0);
        let start = Instant::now();
        for _ in 0..50 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_gap_never_below_rate_limit() {
        let rate = Duration::from_millis(10);
        let limiter = RateLimiter::new(rate, 1.0);

        let mut last: Option<Instant> = None;
        for _ in 0..5 {
            limiter.acquire().await;
            let now = Instant::now();
            if let Some(prev) = last {
                assert!(now - prev >= rate, "permit arrived early: {:?}", now - prev);
            }
            last = Some(now);
        }
    }

    #[tokio::test]
    async fn test_interval_bounded_by_factor() {
        let rate = Duration::from_millis(10);
        let limiter = RateLimiter::new(rate, 2.0);
        for _ in 0..100 {
            let interval = limiter.interval();
            assert!(interval >= rate);
            assert!(interval <= rate.mul_f64(3.0));
        }
    }

    #[tokio::test]
    async fn test_interval_mean_within_jitter_band() {
        let rate = Duration::from_millis(10);
        let factor = 2.0;
        let limiter = RateLimiter::new(rate, factor);

        let samples: u32 = 200;
        let total: Duration = (0..samples).map(|_| limiter.interval()).sum();
        let mean = total / samples;
        assert!(mean >= rate);
        assert!(mean <= rate.mul_f64(1.0 + factor));
    }

    #[tokio::test]
    async fn test_zero_factor_means_fixed_interval() {
        let rate = Duration::from_millis(10);
        let limiter = RateLimiter::new(rate, 0.0);
        for _ in 0..10 {
            assert_eq!(limiter.interval(), rate);
        }
    }
}
