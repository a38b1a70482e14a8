//! Core data types for the storage layer.
//!
//! - [`CheckResult`]: Outcome of a single probe attempt
//! - [`CheckRecord`]: A persisted check result with its row identifier
//! - [`ErrorKind`]: Classification of transport-level probe failures
//! - [`WindowStats`]: Uptime summary over a time window

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::storage::StorageError;

/// Classification of a probe that never produced an HTTP response.
///
/// The string forms are persisted verbatim in the `error_type` column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
pub enum ErrorKind {
    /// The request did not complete within the configured timeout.
    Timeout,
    /// Connection, DNS, TLS, protocol or body failure.
    ClientError,
    /// The request could not be built or failed in an unexpected way.
    Other,
}

/// Result of one probe attempt against one endpoint.
///
/// An HTTP response outside `[200, 400)` carries a status code with `ok = false`
/// and no `error_kind`. Transport failures carry an `error_kind` and no status code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Probe start instant (UTC, microsecond precision).
    pub timestamp: DateTime<Utc>,
    /// Endpoint name.
    pub name: String,
    /// Probed URL.
    pub url: String,
    /// HTTP status code, absent on transport failure.
    pub status_code: Option<u16>,
    /// True iff a status code is present and in `[200, 400)`.
    pub ok: bool,
    /// Request latency in milliseconds.
    pub latency_ms: f64,
    /// Failure classification, absent when a response was received.
    pub error_kind: Option<ErrorKind>,
    /// Human-readable failure description.
    pub error_message: Option<String>,
}

impl CheckResult {
    /// Build a result for a received HTTP response.
    pub fn response(
        timestamp: DateTime<Utc>,
        name: impl Into<String>,
        url: impl Into<String>,
        status_code: u16,
        latency_ms: f64,
    ) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(6),
            name: name.into(),
            url: url.into(),
            status_code: Some(status_code),
            ok: is_ok_status(status_code),
            latency_ms: latency_ms.max(0.0),
            error_kind: None,
            error_message: None,
        }
    }

    /// Build a result for a probe that failed before a response arrived.
    pub fn failure(
        timestamp: DateTime<Utc>,
        name: impl Into<String>,
        url: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
        latency_ms: f64,
    ) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(6),
            name: name.into(),
            url: url.into(),
            status_code: None,
            ok: false,
            latency_ms: latency_ms.max(0.0),
            error_kind: Some(kind),
            error_message: Some(message.into()),
        }
    }
}

/// Compact one-line summary used for the per-probe log line.
impl std::fmt::Display for CheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let outcome = match (self.ok, self.error_kind, self.status_code) {
            (true, _, Some(code)) => format!("✓ {code}"),
            (_, Some(kind), _) => format!("✗ {kind}"),
            (_, None, Some(code)) => format!("✗ {code}"),
            (_, None, None) => "✗ unknown".to_string(),
        };
        write!(
            f,
            "{} | {:20} | {:15} | {:6.1}ms",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S"),
            self.name,
            outcome,
            self.latency_ms
        )
    }
}

/// A persisted check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    /// Auto-assigned, monotonically increasing row identifier.
    pub id: i64,
    /// The stored result.
    #[serde(flatten)]
    pub result: CheckResult,
}

/// Uptime summary over a time window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Number of checks in the window.
    pub total: u64,
    /// Number of checks with `ok = true`.
    pub successful: u64,
    /// Percentage of successful checks (0.0 when `total` is 0).
    pub uptime_percent: f64,
    /// Mean latency of successful checks.
    pub avg_latency_ms: Option<f64>,
}

impl WindowStats {
    pub(crate) fn new(total: u64, successful: u64, avg_latency_ms: Option<f64>) -> Self {
        let uptime_percent = if total == 0 {
            0.0
        } else {
            successful as f64 / total as f64 * 100.0
        };
        Self {
            total,
            successful,
            uptime_percent,
            avg_latency_ms,
        }
    }
}

/// Whether an HTTP status code counts as up.
pub fn is_ok_status(status: u16) -> bool {
    (200..400).contains(&status)
}

/// Format a timestamp as a fixed-width RFC 3339 UTC string.
///
/// Every stored timestamp has the same width, so string order equals time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a timestamp written by [`format_timestamp`] (or any RFC 3339 string).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidData(format!("bad timestamp '{s}': {e}")))
}
