//! Endpoint configuration structures.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::probe::{DEFAULT_INTERVAL, DEFAULT_TIMEOUT, EndpointSpec, HttpMethod};

use super::validation::resolve_duration;

/// One entry of the `endpoints` list, as written in YAML.
///
/// Everything is optional at this level so that missing fields are reported as
/// validation errors naming the offending entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Unique endpoint name.
    #[serde(default)]
    pub name: Option<String>,
    /// Target URL (HTTP or HTTPS).
    #[serde(default)]
    pub url: Option<String>,
    /// HTTP method, case-insensitive (default: GET).
    #[serde(default)]
    pub method: Option<String>,
    /// Probe interval as a humantime string, e.g. `30s`.
    #[serde(default)]
    pub interval: Option<String>,
    /// Probe interval in seconds, fractions allowed.
    #[serde(default)]
    pub interval_seconds: Option<f64>,
    /// Request timeout as a humantime string, e.g. `5s`.
    #[serde(default)]
    pub timeout: Option<String>,
    /// Request timeout in seconds, fractions allowed.
    #[serde(default)]
    pub timeout_seconds: Option<f64>,
}

impl EndpointConfig {
    /// Create an entry with only the required fields.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Validate this entry and apply defaults.
    ///
    /// `index` is the zero-based position in the list, used in error messages
    /// for entries without a usable name.
    pub fn to_spec(&self, index: usize) -> Result<EndpointSpec, String> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .ok_or_else(|| format!("endpoint #{}: missing 'name'", index + 1))?;
        if name.is_empty() {
            return Err(format!("endpoint #{}: name cannot be empty", index + 1));
        }

        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .ok_or_else(|| format!("endpoint '{name}': missing 'url'"))?;
        if url.is_empty() {
            return Err(format!("endpoint '{name}': url cannot be empty"));
        }
        let parsed = url::Url::parse(url)
            .map_err(|e| format!("endpoint '{name}': invalid URL '{url}': {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!(
                "endpoint '{name}': unsupported URL scheme '{}'",
                parsed.scheme()
            ));
        }

        let method = match self.method.as_deref() {
            Some(raw) => HttpMethod::from_str(raw)
                .map_err(|_| format!("endpoint '{name}': unsupported HTTP method '{raw}'"))?,
            None => HttpMethod::default(),
        };

        let interval = resolve_duration(
            "interval",
            self.interval.as_deref(),
            self.interval_seconds,
        )
        .map_err(|e| format!("endpoint '{name}': {e}"))?
        .unwrap_or(DEFAULT_INTERVAL);

        let timeout = resolve_duration("timeout", self.timeout.as_deref(), self.timeout_seconds)
            .map_err(|e| format!("endpoint '{name}': {e}"))?
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(EndpointSpec::new(name, url)
            .with_method(method)
            .with_interval(interval)
            .with_timeout(timeout))
    }
}
