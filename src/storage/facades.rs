//! User-facing storage facades.
//!
//! - `HistoryWriter`: Acknowledged appends via the writer actor
//! - `HistoryReader`: Latest-per-endpoint, time-window and summary queries
//! - `StorageAdmin`: Writer lifecycle

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tokio::sync::{mpsc, oneshot};

use crate::storage::StorageError;
use crate::storage::actor::Command;
use crate::storage::db::SqlitePool;
use crate::storage::types::{
    CheckRecord, CheckResult, ErrorKind, WindowStats, format_timestamp, parse_timestamp,
};

const CHECK_COLUMNS: &str = "id, timestamp_utc, name, url, status_code, ok, latency_ms, \
                             error_type, error_message";

// =============================================================================
// Writer
// =============================================================================

/// Append-only history writer.
///
/// Cheap to clone; every clone feeds the same writer task. `append` waits for
/// channel capacity, then for the insert to be acknowledged.
#[derive(Clone)]
pub struct HistoryWriter {
    tx: mpsc::Sender<Command>,
}

impl std::fmt::Debug for HistoryWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryWriter").finish_non_exhaustive()
    }
}

impl HistoryWriter {
    pub(crate) fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }

    /// Persist one result and return its row id.
    pub async fn append(&self, result: CheckResult) -> Result<i64, StorageError> {
        let (reply, ack) = oneshot::channel();
        self.tx
            .send(Command::Append {
                result: Box::new(result),
                reply,
            })
            .await
            .map_err(|_| StorageError::ChannelSend)?;

        ack.await
            .map_err(|_| StorageError::Internal("writer dropped acknowledgement".to_string()))?
    }

    /// Whether the writer task has stopped accepting commands.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// =============================================================================
// Reader
// =============================================================================

/// History reader over the shared connection pool.
#[derive(Clone)]
pub struct HistoryReader {
    pool: SqlitePool,
}

impl std::fmt::Debug for HistoryReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryReader").finish_non_exhaustive()
    }
}

impl HistoryReader {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Close the underlying pool.
    ///
    /// Only needed for readers opened with [`StorageBuilder::open_read_only`];
    /// [`StorageHandles::shutdown`] closes the shared pool itself.
    ///
    /// [`StorageBuilder::open_read_only`]: crate::storage::StorageBuilder::open_read_only
    /// [`StorageHandles::shutdown`]: crate::storage::StorageHandles::shutdown
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Most recent record for every endpoint name.
    ///
    /// Records sharing the maximum timestamp are resolved by the highest id.
    pub async fn latest_per_endpoint(
        &self,
    ) -> Result<BTreeMap<String, CheckRecord>, StorageError> {
        let rows = sqlx::query(
            "SELECT c.* FROM checks c
             JOIN (SELECT name, MAX(timestamp_utc) AS max_ts FROM checks GROUP BY name) m
               ON c.name = m.name AND c.timestamp_utc = m.max_ts
             ORDER BY c.name, c.id DESC",
        )
        .fetch_all(self.pool.inner())
        .await?;

        let mut latest = BTreeMap::new();
        for row in &rows {
            let record = decode_record(row)?;
            latest.entry(record.result.name.clone()).or_insert(record);
        }
        Ok(latest)
    }

    /// All records with `timestamp >= since`, oldest first.
    ///
    /// `name` restricts the result to one endpoint.
    pub async fn results_in_window(
        &self,
        name: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<Vec<CheckRecord>, StorageError> {
        let mut sql = format!("SELECT {CHECK_COLUMNS} FROM checks WHERE timestamp_utc >= ?");
        if name.is_some() {
            sql.push_str(" AND name = ?");
        }
        sql.push_str(" ORDER BY timestamp_utc ASC, id ASC");

        let mut query = sqlx::query(&sql).bind(window_start(&since));
        if let Some(name) = name {
            query = query.bind(name);
        }
        let rows = query.fetch_all(self.pool.inner()).await?;

        rows.iter().map(decode_record).collect()
    }

    /// Distinct endpoint names present in the history, sorted.
    pub async fn endpoint_names(&self) -> Result<Vec<String>, StorageError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT DISTINCT name FROM checks ORDER BY name")
            .fetch_all(self.pool.inner())
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Uptime and mean latency over records with `timestamp >= since`.
    pub async fn window_stats(
        &self,
        name: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<WindowStats, StorageError> {
        let mut sql = String::from(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(ok), 0) AS successful,
                    AVG(CASE WHEN ok = 1 THEN latency_ms END) AS avg_latency
             FROM checks WHERE timestamp_utc >= ?",
        );
        if name.is_some() {
            sql.push_str(" AND name = ?");
        }

        let mut query = sqlx::query(&sql).bind(window_start(&since));
        if let Some(name) = name {
            query = query.bind(name);
        }
        let row = query.fetch_one(self.pool.inner()).await?;

        let total: i64 = row.try_get("total")?;
        let successful: i64 = row.try_get("successful")?;
        let avg_latency: Option<f64> = row.try_get("avg_latency")?;

        Ok(WindowStats::new(
            total.max(0) as u64,
            successful.max(0) as u64,
            avg_latency,
        ))
    }
}

/// Lower bound of a `timestamp >= since` filter in stored form.
///
/// Stored timestamps have microsecond precision, so a `since` with leftover
/// nanoseconds is rounded up to the next whole microsecond.
fn window_start(since: &DateTime<Utc>) -> String {
    let sub_micro = since.timestamp_subsec_nanos() % 1_000;
    if sub_micro == 0 {
        return format_timestamp(since);
    }
    format_timestamp(&(*since + TimeDelta::nanoseconds(i64::from(1_000 - sub_micro))))
}

fn decode_record(row: &SqliteRow) -> Result<CheckRecord, StorageError> {
    let timestamp = parse_timestamp(&row.try_get::<String, _>("timestamp_utc")?)?;

    let status_code = row
        .try_get::<Option<i64>, _>("status_code")?
        .map(|code| {
            u16::try_from(code)
                .map_err(|_| StorageError::InvalidData(format!("status code out of range: {code}")))
        })
        .transpose()?;

    let error_kind = row
        .try_get::<Option<String>, _>("error_type")?
        .map(|kind| {
            ErrorKind::from_str(&kind)
                .map_err(|_| StorageError::InvalidData(format!("unknown error type '{kind}'")))
        })
        .transpose()?;

    Ok(CheckRecord {
        id: row.try_get("id")?,
        result: CheckResult {
            timestamp,
            name: row.try_get("name")?,
            url: row.try_get("url")?,
            status_code,
            ok: row.try_get("ok")?,
            latency_ms: row.try_get("latency_ms")?,
            error_kind,
            error_message: row.try_get("error_message")?,
        },
    })
}

// =============================================================================
// Admin
// =============================================================================

/// Storage administration.
#[derive(Clone)]
pub struct StorageAdmin {
    tx: mpsc::Sender<Command>,
}

impl std::fmt::Debug for StorageAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAdmin").finish_non_exhaustive()
    }
}

impl StorageAdmin {
    pub(crate) fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }

    /// Ask the writer to drain its queue and stop.
    ///
    /// Returns [`StorageError::ChannelSend`] if the writer is already gone.
    pub async fn shutdown(&self) -> Result<(), StorageError> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| StorageError::ChannelSend)
    }

    /// Non-blocking shutdown request, used where no async context exists.
    pub(crate) fn try_shutdown(&self) {
        if self.tx.try_send(Command::Shutdown).is_err() {
            tracing::debug!("Writer already stopped or queue full, shutdown not queued");
        }
    }
}
