//! Storage builder and handles.
//!
//! Provides a builder pattern for constructing the storage layer
//! and a handles struct for accessing all storage facades.

use std::path::{Path, PathBuf};

use tokio::task::JoinHandle;

use crate::storage::StorageError;
use crate::storage::actor::{DEFAULT_CHANNEL_CAPACITY, DbActor};
use crate::storage::db::SqlitePool;
use crate::storage::schema::init_schema;
use crate::storage::{HistoryReader, HistoryWriter, StorageAdmin};

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Builder for constructing the storage layer.
#[derive(Debug, Clone)]
pub struct StorageBuilder {
    location: Location,
    channel_capacity: usize,
}

impl StorageBuilder {
    /// Create a builder for the database file at `db_path`.
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            location: Location::File(db_path.as_ref().to_path_buf()),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Create a builder for a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the channel capacity for writer commands.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Open the database, initialize the schema and start the writer task.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn build(self) -> Result<StorageHandles, StorageError> {
        let pool = match &self.location {
            Location::File(path) => {
                // Create parent directory if it doesn't exist
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                    && !parent.exists()
                {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        StorageError::Internal(format!(
                            "Failed to create database directory '{}': {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
                SqlitePool::open(path).await?
            }
            Location::Memory => SqlitePool::connect("sqlite::memory:").await?,
        };

        init_schema(&pool).await?;

        let (actor_handle, tx) = DbActor::spawn(pool.clone(), self.channel_capacity);

        Ok(StorageHandles {
            writer: HistoryWriter::new(tx.clone()),
            reader: HistoryReader::new(pool.clone()),
            admin: StorageAdmin::new(tx),
            pool,
            actor_handle: Some(actor_handle),
        })
    }

    /// Open an existing history file for queries only.
    ///
    /// Nothing is written: no schema initialization, no writer task and no
    /// journal mode change. The caller closes the reader when done.
    pub async fn open_read_only(self) -> Result<HistoryReader, StorageError> {
        match self.location {
            Location::File(path) => {
                let pool = SqlitePool::open_read_only(path).await?;
                Ok(HistoryReader::new(pool))
            }
            Location::Memory => Err(StorageError::Internal(
                "an in-memory database cannot be opened read-only".to_string(),
            )),
        }
    }
}

/// Handles to all storage layer facades.
pub struct StorageHandles {
    /// Append-only writer facade.
    pub writer: HistoryWriter,
    /// Query facade.
    pub reader: HistoryReader,
    /// Facade for storage administration.
    pub admin: StorageAdmin,
    pool: SqlitePool,
    /// Internal actor handle for graceful shutdown.
    actor_handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for StorageHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageHandles")
            .field("running", &self.actor_handle.is_some())
            .finish_non_exhaustive()
    }
}

impl StorageHandles {
    /// Gracefully shutdown the storage layer.
    ///
    /// Appends already queued are written before the writer exits; the pool is
    /// closed afterwards.
    pub async fn shutdown(mut self) -> Result<(), StorageError> {
        // A writer that already exited is not an error here.
        let _ = self.admin.shutdown().await;

        if let Some(handle) = self.actor_handle.take() {
            handle
                .await
                .map_err(|e| StorageError::Internal(format!("Failed to join writer task: {e}")))?;
        }

        self.pool.close().await;
        tracing::info!("Storage shut down");
        Ok(())
    }
}

impl Drop for StorageHandles {
    fn drop(&mut self) {
        // No async context here: queue a shutdown and let the writer drain on its own.
        if self.actor_handle.take().is_some() {
            self.admin.try_shutdown();
        }
    }
}
