//! Configuration validation utilities.

use std::time::Duration;

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Parse duration string using humantime.
///
/// Supports various formats: `30s`, `1m`, `5m30s`, `1h`, `2h30m`, `1d`, `100ms`, etc.
///
/// # Examples
///
/// ```
/// use pingpal::config::parse_duration;
///
/// assert_eq!(parse_duration("30s").unwrap().as_secs(), 30);
/// assert_eq!(parse_duration("1m").unwrap().as_secs(), 60);
/// assert_eq!(parse_duration("1h30m").unwrap().as_secs(), 5400);
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration string is empty".to_string());
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Resolve a duration given either as a humantime string or as seconds.
///
/// Seconds may be fractional. Returns `Ok(None)` when neither form is present.
pub(crate) fn resolve_duration(
    field: &str,
    text: Option<&str>,
    seconds: Option<f64>,
) -> Result<Option<Duration>, String> {
    let duration = match (text, seconds) {
        (Some(_), Some(_)) => {
            return Err(format!(
                "specify either '{field}' or '{field}_seconds', not both"
            ));
        }
        (Some(text), None) => parse_duration(text).map_err(|e| format!("{field}: {e}"))?,
        (None, Some(secs)) => {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(format!("{field}_seconds must be a positive number, got {secs}"));
            }
            Duration::try_from_secs_f64(secs).map_err(|e| format!("{field}_seconds: {e}"))?
        }
        (None, None) => return Ok(None),
    };

    if duration.is_zero() {
        return Err(format!("{field} must be positive"));
    }
    Ok(Some(duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_valid() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration(" 5m ").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("30x").is_err());
        assert!(parse_duration("30").is_err());
    }

    #[test]
    fn test_resolve_duration_forms() {
        assert_eq!(
            resolve_duration("interval", Some("2m"), None).unwrap(),
            Some(Duration::from_secs(120))
        );
        assert_eq!(
            resolve_duration("interval", None, Some(45.0)).unwrap(),
            Some(Duration::from_secs(45))
        );
        assert_eq!(
            resolve_duration("timeout", None, Some(1.5)).unwrap(),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(resolve_duration("interval", None, None).unwrap(), None);
    }

    #[test]
    fn test_resolve_duration_rejects_zero_and_conflicts() {
        let err = resolve_duration("timeout", None, Some(0.0)).unwrap_err();
        assert!(err.contains("must be a positive number"));

        let err = resolve_duration("timeout", None, Some(-2.5)).unwrap_err();
        assert!(err.contains("must be a positive number"));

        let err = resolve_duration("interval", None, Some(f64::NAN)).unwrap_err();
        assert!(err.contains("must be a positive number"));

        let err = resolve_duration("interval", None, Some(f64::INFINITY)).unwrap_err();
        assert!(err.contains("must be a positive number"));

        let err = resolve_duration("timeout", Some("0s"), None).unwrap_err();
        assert!(err.contains("must be positive"));

        let err = resolve_duration("interval", Some("5s"), Some(5.0)).unwrap_err();
        assert!(err.contains("not both"));
    }
}
