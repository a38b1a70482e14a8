//! Process-level orchestration.
//!
//! The [`Supervisor`] opens the history store, starts one probe loop per
//! endpoint, waits for a shutdown signal and then stops the loops before
//! draining the writer.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::probe::EndpointSpec;
use crate::scheduler::{DEFAULT_SHUTDOWN_TIMEOUT, Scheduler, SchedulerError};
use crate::storage::{StorageBuilder, StorageError};

/// Errors surfaced to the entry point.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Everything the supervisor needs to run.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Endpoints to monitor, in configuration order.
    pub endpoints: Vec<EndpointSpec>,
    /// History database file.
    pub db_path: PathBuf,
    /// Writer channel capacity.
    pub channel_capacity: usize,
    /// Upper bound on waiting for probe loops at shutdown.
    pub shutdown_timeout: Duration,
}

impl MonitorConfig {
    /// Build from a validated application config.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoints: config.to_endpoint_specs()?,
            db_path: config.database.path.clone(),
            channel_capacity: config.database.channel_capacity,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        })
    }
}

/// Runs the monitor until told to stop.
#[derive(Debug)]
pub struct Supervisor {
    config: MonitorConfig,
}

impl Supervisor {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    /// Monitor every endpoint until `shutdown` resolves.
    ///
    /// Returns immediately when no endpoints are configured. On shutdown the
    /// probe loops are stopped first (bounded by the shutdown timeout), then
    /// the writer drains its queue and the database is closed.
    pub async fn run<F>(self, shutdown: F) -> Result<(), SupervisorError>
    where
        F: Future<Output = ()> + Send,
    {
        let MonitorConfig {
            endpoints,
            db_path,
            channel_capacity,
            shutdown_timeout,
        } = self.config;

        if endpoints.is_empty() {
            tracing::info!("No endpoints configured, nothing to monitor");
            return Ok(());
        }

        tracing::info!(path = %db_path.display(), "Initializing storage");
        let storage = StorageBuilder::new(&db_path)
            .channel_capacity(channel_capacity)
            .build()
            .await?;

        let scheduler = match Scheduler::with_http(storage.writer.clone()) {
            Ok(scheduler) => scheduler,
            Err(e) => {
                storage.shutdown().await?;
                return Err(e.into());
            }
        };

        let total = endpoints.len();
        for spec in endpoints {
            if let Err(e) = scheduler.spawn(spec).await {
                scheduler.shutdown_with_timeout(shutdown_timeout).await;
                storage.shutdown().await?;
                return Err(e.into());
            }
        }
        tracing::info!(endpoints = total, "Monitoring started");

        shutdown.await;

        tracing::info!("Shutting down probe loops...");
        scheduler.shutdown_with_timeout(shutdown_timeout).await;

        tracing::info!("Shutting down storage...");
        storage.shutdown().await?;

        tracing::info!("Shutdown complete");
        Ok(())
    }
}
