//! Writer actor with a bounded tokio channel.
//!
//! Single-writer pattern: one task owns all inserts and processes commands in
//! arrival order. Every append is acknowledged individually through a oneshot
//! channel carrying the new row id.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::storage::StorageError;
use crate::storage::db::SqlitePool;
use crate::storage::types::{CheckResult, format_timestamp};

// =============================================================================
// Constants
// =============================================================================

/// Default channel capacity for writer commands.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

const INSERT_CHECK_SQL: &str = "INSERT INTO checks \
    (timestamp_utc, name, url, status_code, ok, latency_ms, error_type, error_message) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)";

// =============================================================================
// Commands
// =============================================================================

/// Reply channel for an append, carrying the assigned row id.
pub type AppendReply = oneshot::Sender<Result<i64, StorageError>>;

/// Commands sent to the writer actor.
#[derive(Debug)]
pub enum Command {
    /// Insert one check result.
    Append {
        result: Box<CheckResult>,
        reply: AppendReply,
    },
    /// Stop accepting commands, drain the queue, then exit.
    Shutdown,
}

// =============================================================================
// Actor
// =============================================================================

/// Database writer actor.
pub struct DbActor {
    pool: SqlitePool,
    rx: mpsc::Receiver<Command>,
}

impl DbActor {
    /// Spawn the writer task on the current runtime.
    ///
    /// The schema must already be initialized on `pool`.
    pub fn spawn(
        pool: SqlitePool,
        channel_capacity: usize,
    ) -> (JoinHandle<()>, mpsc::Sender<Command>) {
        let (tx, rx) = mpsc::channel(channel_capacity.max(1));
        let actor = DbActor { pool, rx };
        let handle = tokio::spawn(actor.run());
        (handle, tx)
    }

    async fn run(mut self) {
        tracing::info!("DbActor started");

        while let Some(cmd) = self.rx.recv().await {
            if let Command::Shutdown = cmd {
                tracing::info!("DbActor shutting down");
                self.drain().await;
                break;
            }
            self.handle_command(cmd).await;
        }

        tracing::info!("DbActor stopped");
    }

    /// Close intake and execute whatever is already queued.
    async fn drain(&mut self) {
        self.rx.close();
        let mut drained = 0usize;
        while let Some(cmd) = self.rx.recv().await {
            if !matches!(cmd, Command::Shutdown) {
                self.handle_command(cmd).await;
                drained += 1;
            }
        }
        if drained > 0 {
            tracing::debug!(count = drained, "Drained queued writes");
        }
    }

    async fn handle_command(&self, cmd: Command) {
        match cmd {
            Command::Append { result, reply } => {
                let outcome = self.insert_check(&result).await;
                if let Err(e) = &outcome {
                    tracing::error!(endpoint = %result.name, error = %e, "Check insert failed");
                }
                // The caller may have stopped waiting; the row is committed regardless.
                let _ = reply.send(outcome);
            }
            Command::Shutdown => {}
        }
    }

    // =========================================================================
    // Insert Operations
    // =========================================================================

    async fn insert_check(&self, r: &CheckResult) -> Result<i64, StorageError> {
        let done = sqlx::query(INSERT_CHECK_SQL)
            .bind(format_timestamp(&r.timestamp))
            .bind(&r.name)
            .bind(&r.url)
            .bind(r.status_code.map(i64::from))
            .bind(r.ok)
            .bind(r.latency_ms)
            .bind(r.error_kind.map(|k| k.as_ref().to_string()))
            .bind(r.error_message.as_deref())
            .execute(self.pool.inner())
            .await?;

        Ok(done.last_insert_rowid())
    }
}
