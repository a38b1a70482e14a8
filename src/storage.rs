//! Storage Layer
//!
//! Append-only SQLite history of probe results with read/write separation:
//! - **Writer**: Async task with exclusive inserts fed by a bounded tokio mpsc channel
//! - **Reader**: Connection pool for concurrent queries
//!
//! # Components
//!
//! - [`HistoryWriter`]: Acknowledged appends, safe to share across tasks
//! - [`HistoryReader`]: Latest-per-endpoint, time-window and uptime queries
//! - [`StorageAdmin`]: Writer lifecycle
//! - [`StorageBuilder`] / [`StorageHandles`]: Initialization and lifecycle management

mod actor;
mod builder;
pub mod db;
mod error;
mod facades;
pub mod schema;
mod types;

pub use builder::{StorageBuilder, StorageHandles};
pub use error::StorageError;
pub use facades::{HistoryReader, HistoryWriter, StorageAdmin};
pub use types::{
    CheckRecord, CheckResult, ErrorKind, WindowStats, format_timestamp, is_ok_status,
    parse_timestamp,
};
