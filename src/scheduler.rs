//! Endpoint scheduling.
//!
//! One tokio task per endpoint probes, persists, logs and sleeps until its
//! cancellation token fires. The [`Scheduler`] owns those tasks and a root
//! token that stops all of them at once.

mod endpoint_loop;
mod registry;

pub use endpoint_loop::run_endpoint;
pub use registry::{DEFAULT_SHUTDOWN_TIMEOUT, JobInfo, Scheduler, SchedulerError};
