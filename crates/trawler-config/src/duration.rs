//! Duration-string parsing shared by the config file and env tunables.

use std::time::Duration;

/// Parse a duration string (supports "500ms", "2s", "5m", "1h"; a bare
/// integer is taken as seconds).
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();

    if let Some(num) = s.strip_suffix("ms") {
        let num = num
            .parse::<u64>()
            .map_err(|e| format!("invalid milliseconds: {}", e))?;
        Ok(Duration::from_millis(num))
    } else if let Some(num) = s.strip_suffix('s') {
        let num = num
            .parse::<u64>()
            .map_err(|e| format!("invalid seconds: {}", e))?;
        Ok(Duration::from_secs(num))
    } else if let Some(num) = s.strip_suffix('m') {
        let num = num
            .parse::<u64>()
            .map_err(|e| format!("invalid minutes: {}", e))?;
        Ok(Duration::from_secs(num * 60))
    } else if let Some(num) = s.strip_suffix('h') {
        let num = num
            .parse::<u64>()
            .map_err(|e| format!("invalid hours: {}", e))?;
        Ok(Duration::from_secs(num * 3600))
    } else if let Ok(num) = s.parse::<u64>() {
        Ok(Duration::from_secs(num))
    } else {
        Err(format!("invalid duration format: {}", s))
    }
}

/// Render a duration the way the config file spells it.
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{}ms", millis)
    }
}

/// Serde adapter for duration-string fields (`rate_limit: "2s"`).
pub mod serde_str {
    use super::{format_duration, parse_duration};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
