//! Process-wide defaults and `CRAWLER_`-prefixed environment tunables.

use crate::duration::parse_duration;
use crate::ConfigError;
use std::env;
use std::time::Duration;

const ENV_PREFIX: &str = "CRAWLER_";

/// Crawler-wide default values.
///
/// Owned by the coordinator constructor and passed around by immutable
/// reference; nothing reads the environment after startup.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlerDefaults {
    /// Retry budget for transient fetch and indexing failures.
    pub max_retries: u32,
    /// Crawl depth when a source does not specify one.
    pub max_depth: u32,
    /// Inter-request interval when a source does not specify one.
    pub rate_limit: Duration,
    /// Worker parallelism when a source does not specify one.
    pub max_concurrency: usize,
    /// Channel capacity between the fetch driver and the processors.
    pub buffer_size: usize,
    /// How long `Stop` waits for workers to drain.
    pub shutdown_timeout: Duration,
    pub startup_timeout: Duration,
    /// Bound for one fetch, one indexer call, or one event handler.
    pub operation_timeout: Duration,
    /// Jitter ceiling as a multiple of the rate limit.
    pub random_delay_factor: f64,
}

impl Default for CrawlerDefaults {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_depth: 2,
            rate_limit: Duration::from_secs(2),
            max_concurrency: 2,
            buffer_size: 100,
            shutdown_timeout: Duration::from_secs(10),
            startup_timeout: Duration::from_secs(30),
            operation_timeout: Duration::from_secs(30),
            random_delay_factor: 2.0,
        }
    }
}

impl CrawlerDefaults {
    /// Build defaults with `CRAWLER_*` environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut defaults = Self::default();

        if let Some(v) = read_uint("MAX_RETRIES")? {
            defaults.max_retries = v as u32;
        }
        if let Some(v) = read_uint("MAX_DEPTH")? {
            defaults.max_depth = v as u32;
        }
        if let Some(v) = read_duration("RATE_LIMIT")? {
            defaults.rate_limit = v;
        }
        if let Some(v) = read_uint("MAX_CONCURRENCY")? {
            defaults.max_concurrency = v.max(1) as usize;
        }
        if let Some(v) = read_uint("BUFFER_SIZE")? {
            defaults.buffer_size = v.max(1) as usize;
        }
        if let Some(v) = read_duration("SHUTDOWN_TIMEOUT")? {
            defaults.shutdown_timeout = v;
        }
        if let Some(v) = read_duration("STARTUP_TIMEOUT")? {
            defaults.startup_timeout = v;
        }
        if let Some(v) = read_duration("OPERATION_TIMEOUT")? {
            defaults.operation_timeout = v;
        }
        if let Some(v) = read_float("RANDOM_DELAY_FACTOR")? {
            if v < 0.0 {
                return Err(ConfigError::InvalidEnv {
                    var: var_name("RANDOM_DELAY_FACTOR"),
                    reason: "must be non-negative".to_string(),
                });
            }
            defaults.random_delay_factor = v;
        }

        Ok(defaults)
    }
}

fn var_name(var: &str) -> String {
    format!("{}{}", ENV_PREFIX, var)
}

fn read_raw(var: &str) -> Option<String> {
    env::var(var_name(var)).ok().filter(|v| !v.trim().is_empty())
}

fn read_uint(var: &str) -> Result<Option<u64>, ConfigError> {
    match read_raw(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnv {
                var: var_name(var),
                reason: format!("cannot parse as unsigned integer: {}", e),
            }),
    }
}

fn read_float(var: &str) -> Result<Option<f64>, ConfigError> {
    match read_raw(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnv {
                var: var_name(var),
                reason: format!("cannot parse as float: {}", e),
            }),
    }
}

fn read_duration(var: &str) -> Result<Option<Duration>, ConfigError> {
    match read_raw(var) {
        None => Ok(None),
        Some(raw) => parse_duration(&raw)
            .map(Some)
            .map_err(|reason| ConfigError::InvalidEnv {
                var: var_name(var),
                reason,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults_match_contract() {
        let defaults = CrawlerDefaults::default();
        assert_eq!(defaults.max_retries, 3);
        assert_eq!(defaults.max_depth, 2);
        assert_eq!(defaults.rate_limit, Duration::from_secs(2));
        assert_eq!(defaults.max_concurrency, 2);
        assert_eq!(defaults.buffer_size, 100);
        assert_eq!(defaults.shutdown_timeout, Duration::from_secs(10));
        assert_eq!(defaults.startup_timeout, Duration::from_secs(30));
        assert_eq!(defaults.operation_timeout, Duration::from_secs(30));
        assert_eq!(defaults.random_delay_factor, 2.0);
    }

    // Env-var tests mutate process state, so they run in one test to avoid
    // interleaving with each other.
    #[test]
    fn test_env_overrides_and_validation() {
        env::set_var("CRAWLER_MAX_RETRIES", "5");
        env::set_var("CRAWLER_RATE_LIMIT", "250ms");
        let defaults = CrawlerDefaults::from_env().expect("valid env");
        assert_eq!(defaults.max_retries, 5);
        assert_eq!(defaults.rate_limit, Duration::from_millis(250));

        env::set_var("CRAWLER_MAX_RETRIES", "many");
        assert!(CrawlerDefaults::from_env().is_err());

        env::remove_var("CRAWLER_MAX_RETRIES");
        env::remove_var("CRAWLER_RATE_LIMIT");
    }
}
