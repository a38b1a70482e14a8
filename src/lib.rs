//! PingPal - HTTP endpoint monitoring library
//!
//! Periodically probes a configured set of HTTP endpoints and records every
//! outcome in an append-only SQLite history. It can be used as a library by
//! other Rust projects, or run as a standalone binary with the `pingpal`
//! executable.
//!
//! # Architecture
//!
//! - **Config**: YAML endpoint list with validation and defaults
//! - **Probe**: One HTTP request per invocation, failures captured as data
//! - **Scheduler**: One cancellable tokio task per endpoint
//! - **Storage**: Single-writer SQLite history with pooled readers
//! - **Supervisor**: Startup and ordered graceful shutdown
//!
//! # Example
//!
//! ```rust,ignore
//! use pingpal::{AppConfig, MonitorConfig, Supervisor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load("endpoints.yml")?;
//!     let monitor = MonitorConfig::from_app_config(&config)?;
//!
//!     Supervisor::new(monitor)
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod probe;
pub mod report;
pub mod scheduler;
pub mod storage;
pub mod supervisor;

pub use config::{AppConfig, ConfigError};
pub use probe::{EndpointSpec, HttpMethod, HttpProber, Prober};
pub use report::StatusReport;
pub use scheduler::{JobInfo, Scheduler, SchedulerError};
pub use storage::{
    CheckRecord, CheckResult, ErrorKind, HistoryReader, HistoryWriter, StorageBuilder,
    StorageError, StorageHandles, WindowStats,
};
pub use supervisor::{MonitorConfig, Supervisor, SupervisorError};
