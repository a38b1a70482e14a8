//! Read-only status report over the history store.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::storage::{CheckRecord, HistoryReader, StorageBuilder, StorageError, WindowStats};

/// Latest result and window summary for every endpoint in the history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    /// Start of the summary window.
    pub since: DateTime<Utc>,
    /// Most recent record per endpoint name.
    pub latest: BTreeMap<String, CheckRecord>,
    /// Window summary per endpoint name.
    pub stats: BTreeMap<String, WindowStats>,
}

impl StatusReport {
    /// Collect the report from the store.
    ///
    /// `endpoint` restricts the report to one endpoint name.
    pub async fn collect(
        reader: &HistoryReader,
        since: DateTime<Utc>,
        endpoint: Option<&str>,
    ) -> Result<Self, StorageError> {
        let mut latest = reader.latest_per_endpoint().await?;
        if let Some(endpoint) = endpoint {
            latest.retain(|name, _| name == endpoint);
        }

        let mut stats = BTreeMap::new();
        for name in latest.keys() {
            let summary = reader.window_stats(Some(name), since).await?;
            stats.insert(name.clone(), summary);
        }

        Ok(Self {
            since,
            latest,
            stats,
        })
    }

    /// Open the history file read-only, collect the report and close it again.
    pub async fn from_file(
        db_path: impl AsRef<Path>,
        since: DateTime<Utc>,
        endpoint: Option<&str>,
    ) -> Result<Self, StorageError> {
        let reader = StorageBuilder::new(db_path).open_read_only().await?;
        let report = Self::collect(&reader, since, endpoint).await;
        reader.close().await;
        report
    }

    /// Render as a plain-text table, one line per endpoint.
    pub fn render_table(&self) -> String {
        if self.latest.is_empty() {
            return "No checks recorded yet.\n".to_string();
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:20} | {:15} | {:>8} | {:19} | {:>7} | {:>6} | {:>9}",
            "ENDPOINT", "LAST STATUS", "LATENCY", "LAST CHECK (UTC)", "UPTIME", "CHECKS", "AVG"
        );

        for (name, record) in &self.latest {
            let r = &record.result;
            let status = match (r.status_code, r.error_kind) {
                (Some(code), _) if r.ok => format!("✓ {code}"),
                (_, Some(kind)) => format!("✗ {kind}"),
                (Some(code), None) => format!("✗ {code}"),
                (None, None) => "✗".to_string(),
            };
            let window = self.stats.get(name).cloned().unwrap_or_default();
            let uptime = if window.total == 0 {
                "-".to_string()
            } else {
                format!("{:.1}%", window.uptime_percent)
            };
            let avg = window
                .avg_latency_ms
                .map(|ms| format!("{ms:.1}ms"))
                .unwrap_or_else(|| "-".to_string());

            let _ = writeln!(
                out,
                "{:20} | {:15} | {:>6.1}ms | {:19} | {:>7} | {:>6} | {:>9}",
                name,
                status,
                r.latency_ms,
                r.timestamp.format("%Y-%m-%d %H:%M:%S"),
                uptime,
                window.total,
                avg
            );
        }
        out
    }
}
