//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a ratio in the half-open interval (0, 1]
pub fn validate_ratio(value: f64, field_name: &str, domain: &str) -> ConfigResult<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be in (0, 1], got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a port number
pub fn validate_port_range(port: u16, field_name: &str, domain: &str) -> ConfigResult<()> {
    if port == 0 {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be 0", field_name),
        });
    }
    Ok(())
}

/// Validate a `host:port` endpoint string
pub fn validate_endpoint(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(value, field_name, domain)?;

    let valid = value
        .rsplit_once(':')
        .map(|(host, port)| !host.is_empty() && port.parse::<u16>().map_or(false, |p| p != 0))
        .unwrap_or(false);

    if !valid {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} '{}' is not a host:port address", field_name, value),
        });
    }
    Ok(())
}

/// Validate a ceiling against the value it bounds
pub fn validate_ceiling(
    ceiling: Option<u64>,
    start: u64,
    field_name: &str,
    domain: &str,
) -> ConfigResult<()> {
    if let Some(max) = ceiling {
        if max < start {
            return Err(ConfigError::DomainError {
                domain: domain.to_string(),
                message: format!("{} ({}) is below the starting rate ({})", field_name, max, start),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(1u64, "rate", "stress").is_ok());
        let err = validate_positive(0u64, "rate", "stress").unwrap_err();
        assert_eq!(err.domain(), Some("stress"));
    }

    #[test]
    fn test_validate_ratio() {
        assert!(validate_ratio(0.05, "r", "magic").is_ok());
        assert!(validate_ratio(1.0, "r", "magic").is_ok());
        assert!(validate_ratio(0.0, "r", "magic").is_err());
        assert!(validate_ratio(1.5, "r", "magic").is_err());
        assert!(validate_ratio(f64::NAN, "r", "magic").is_err());
    }

    #[test]
    fn test_validate_endpoint() {
        assert!(validate_endpoint("10.0.0.7:1717", "workers", "coordinator").is_ok());
        assert!(validate_endpoint("bench-3.lan:1717", "workers", "coordinator").is_ok());
        assert!(validate_endpoint("bench-3.lan", "workers", "coordinator").is_err());
        assert!(validate_endpoint(":1717", "workers", "coordinator").is_err());
        assert!(validate_endpoint("host:0", "workers", "coordinator").is_err());
        assert!(validate_endpoint("", "workers", "coordinator").is_err());
    }

    #[test]
    fn test_validate_ceiling() {
        assert!(validate_ceiling(None, 25, "max_rate", "stress").is_ok());
        assert!(validate_ceiling(Some(25), 25, "max_rate", "stress").is_ok());
        assert!(validate_ceiling(Some(10), 25, "max_rate", "stress").is_err());
    }
}
