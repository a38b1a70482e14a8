//! Database schema definitions.

use crate::storage::StorageError;
use crate::storage::db::SqlitePool;

/// SQL statement for creating the append-only `checks` table.
///
/// `timestamp_utc` holds fixed-width RFC 3339 strings, so text comparison
/// orders rows chronologically.
pub const CHECKS_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS checks (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp_utc TEXT NOT NULL,
    name          TEXT NOT NULL,
    url           TEXT NOT NULL,
    status_code   INTEGER,
    ok            INTEGER NOT NULL,
    latency_ms    REAL NOT NULL,
    error_type    TEXT,
    error_message TEXT
)
"#;

/// Indexes serving the time-range and latest-per-endpoint queries.
pub const CHECKS_INDEX_DDL: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_timestamp ON checks (timestamp_utc)",
    "CREATE INDEX IF NOT EXISTS idx_name ON checks (name)",
    "CREATE INDEX IF NOT EXISTS idx_name_timestamp ON checks (name, timestamp_utc)",
];

/// Initialize the database schema.
///
/// Idempotent: existing tables, indexes and rows are left untouched.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    let mut tx = pool.inner().begin().await?;
    sqlx::query(CHECKS_TABLE_DDL).execute(&mut *tx).await?;
    for ddl in CHECKS_INDEX_DDL {
        sqlx::query(ddl).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!("Database schema initialized");
    Ok(())
}
