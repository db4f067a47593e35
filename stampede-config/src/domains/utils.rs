//! Utility functions and helpers for configuration

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Serde helper module for Duration serialization as seconds
pub mod serde_duration {
    use super::*;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(seconds))
    }
}

/// Parse a whole number of seconds from an environment value
pub fn parse_seconds(value: &str) -> Result<Duration, std::num::ParseIntError> {
    value.trim().parse::<u64>().map(Duration::from_secs)
}

/// Default functions for serde
pub fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "serde_duration")]
        delay: Duration,
    }

    #[test]
    fn test_duration_as_seconds() {
        let parsed: Wrapper = serde_yaml::from_str("delay: 300").unwrap();
        assert_eq!(parsed.delay, Duration::from_secs(300));
        assert_eq!(serde_yaml::to_string(&parsed).unwrap().trim(), "delay: 300");
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds(" 5 ").unwrap(), Duration::from_secs(5));
        assert!(parse_seconds("5s").is_err());
    }
}
