//! Scheduler registry for managing endpoint loop lifecycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::probe::{EndpointSpec, HttpMethod, HttpProber, Prober};
use crate::storage::HistoryWriter;

use super::endpoint_loop::run_endpoint;

/// Default timeout for graceful shutdown (5 seconds).
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Scheduler error types.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// An endpoint with this name is already running.
    #[error("endpoint '{0}' is already scheduled")]
    DuplicateEndpoint(String),

    /// No running endpoint has this name.
    #[error("endpoint '{0}' is not scheduled")]
    NotFound(String),

    /// Shutdown has begun; no new loops are accepted.
    #[error("scheduler is shutting down")]
    ShuttingDown,

    /// The shared HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Metadata about a running endpoint loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    /// Endpoint name.
    pub name: String,
    /// Probed URL.
    pub url: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Sleep between probes.
    pub interval: Duration,
    /// Request timeout.
    pub timeout: Duration,
}

impl From<&EndpointSpec> for JobInfo {
    fn from(spec: &EndpointSpec) -> Self {
        Self {
            name: spec.name.clone(),
            url: spec.url.clone(),
            method: spec.method,
            interval: spec.interval,
            timeout: spec.timeout,
        }
    }
}

struct Job {
    info: JobInfo,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Registry owning one probe loop per endpoint.
///
/// Every loop runs on a child of the registry's root token, so a single
/// cancellation stops them all. The prober and writer are shared by every loop.
pub struct Scheduler {
    prober: Arc<dyn Prober>,
    writer: HistoryWriter,
    root: CancellationToken,
    jobs: RwLock<HashMap<String, Job>>,
}

impl Scheduler {
    /// Create a scheduler around a prober and the history writer.
    pub fn new(prober: Arc<dyn Prober>, writer: HistoryWriter) -> Self {
        Self {
            prober,
            writer,
            root: CancellationToken::new(),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Create a scheduler probing over HTTP with a freshly built shared client.
    ///
    /// # Errors
    /// Returns `SchedulerError::Client` if the HTTP client cannot be built.
    pub fn with_http(writer: HistoryWriter) -> Result<Self, SchedulerError> {
        let prober = HttpProber::new()?;
        Ok(Self::new(Arc::new(prober), writer))
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field(
                "job_count",
                &self.jobs.try_read().map(|j| j.len()).unwrap_or(0),
            )
            .field("shutting_down", &self.root.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Start a probe loop for `spec`.
    ///
    /// # Errors
    /// - `SchedulerError::DuplicateEndpoint` if a loop with the same name runs
    /// - `SchedulerError::ShuttingDown` once shutdown has begun
    pub async fn spawn(&self, spec: EndpointSpec) -> Result<JobInfo, SchedulerError> {
        let mut jobs = self.jobs.write().await;

        if self.root.is_cancelled() {
            return Err(SchedulerError::ShuttingDown);
        }
        if jobs.contains_key(&spec.name) {
            return Err(SchedulerError::DuplicateEndpoint(spec.name));
        }

        let info = JobInfo::from(&spec);
        let cancel = self.root.child_token();
        let handle = tokio::spawn(run_endpoint(
            spec,
            Arc::clone(&self.prober),
            self.writer.clone(),
            cancel.clone(),
        ));

        jobs.insert(
            info.name.clone(),
            Job {
                info: info.clone(),
                cancel,
                handle,
            },
        );

        tracing::info!(endpoint = %info.name, url = %info.url, "Endpoint scheduled");
        Ok(info)
    }

    /// List all running loops, sorted by name.
    pub async fn list_jobs(&self) -> Vec<JobInfo> {
        let mut infos: Vec<JobInfo> = self
            .jobs
            .read()
            .await
            .values()
            .map(|j| j.info.clone())
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Get the number of running loops.
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Stop one loop and wait for it to exit.
    ///
    /// # Errors
    /// Returns `SchedulerError::NotFound` if no loop has this name.
    pub async fn remove(&self, name: &str) -> Result<(), SchedulerError> {
        let job = self
            .jobs
            .write()
            .await
            .remove(name)
            .ok_or_else(|| SchedulerError::NotFound(name.to_string()))?;

        job.cancel.cancel();
        join_job(&job.info.name, job.handle).await;

        tracing::info!(endpoint = %name, "Endpoint removed");
        Ok(())
    }

    /// Whether shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Gracefully stop every loop with the default timeout.
    pub async fn shutdown(&self) {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await;
    }

    /// Stop every loop, waiting at most `timeout` for them to exit.
    ///
    /// A timeout is logged, not returned: loops still running are abandoned.
    pub async fn shutdown_with_timeout(&self, timeout: Duration) {
        let jobs: Vec<Job> = {
            let mut jobs = self.jobs.write().await;
            self.root.cancel();
            jobs.drain().map(|(_, job)| job).collect()
        };
        let job_count = jobs.len();

        let joined = tokio::time::timeout(timeout, async {
            for job in jobs {
                join_job(&job.info.name, job.handle).await;
            }
        })
        .await;

        match joined {
            Ok(()) => tracing::info!(job_count, "Scheduler shutdown complete"),
            Err(_) => tracing::warn!(
                job_count,
                timeout_ms = timeout.as_millis(),
                "Scheduler shutdown timed out"
            ),
        }
    }
}

async fn join_job(name: &str, handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        if e.is_panic() {
            tracing::error!(endpoint = %name, "Endpoint loop panicked");
        } else {
            tracing::warn!(endpoint = %name, error = %e, "Endpoint loop aborted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;

    use crate::storage::{CheckResult, StorageBuilder};

    #[derive(Default)]
    struct CountingProber {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Prober for CountingProber {
        async fn probe(&self, spec: &EndpointSpec) -> CheckResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            CheckResult::response(Utc::now(), &spec.name, &spec.url, 204, 0.5)
        }
    }

    fn spec(name: &str, interval_ms: u64) -> EndpointSpec {
        EndpointSpec::new(name, format!("http://{name}.local/"))
            .with_interval(Duration::from_millis(interval_ms))
    }

    #[tokio::test]
    async fn test_spawn_and_list() {
        let storage = StorageBuilder::in_memory().build().await.unwrap();
        let scheduler = Scheduler::new(Arc::new(CountingProber::default()), storage.writer.clone());

        let info = scheduler.spawn(spec("b", 1000)).await.unwrap();
        assert_eq!(info.name, "b");
        scheduler.spawn(spec("a", 1000)).await.unwrap();

        assert_eq!(scheduler.job_count().await, 2);
        let names: Vec<_> = scheduler
            .list_jobs()
            .await
            .into_iter()
            .map(|j| j.name)
            .collect();
        assert_eq!(names, ["a", "b"]);

        scheduler.shutdown().await;
        assert_eq!(scheduler.job_count().await, 0);
        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_spawn_rejected() {
        let storage = StorageBuilder::in_memory().build().await.unwrap();
        let scheduler = Scheduler::new(Arc::new(CountingProber::default()), storage.writer.clone());

        scheduler.spawn(spec("api", 1000)).await.unwrap();
        let err = scheduler.spawn(spec("api", 500)).await.unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateEndpoint(ref n) if n == "api"));
        assert_eq!(scheduler.job_count().await, 1);

        scheduler.shutdown().await;
        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_stops_loop() {
        let storage = StorageBuilder::in_memory().build().await.unwrap();
        let prober = Arc::new(CountingProber::default());
        let scheduler = Scheduler::new(prober.clone(), storage.writer.clone());

        scheduler.spawn(spec("api", 50)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        tokio::time::timeout(Duration::from_secs(1), scheduler.remove("api"))
            .await
            .expect("remove should finish promptly")
            .unwrap();
        let after_remove = prober.calls.load(Ordering::SeqCst);
        assert!(after_remove >= 2);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(prober.calls.load(Ordering::SeqCst), after_remove);

        let err = scheduler.remove("api").await.unwrap_err();
        assert!(matches!(err, SchedulerError::NotFound(_)));

        scheduler.shutdown().await;
        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_spawn_after_shutdown_refused() {
        let storage = StorageBuilder::in_memory().build().await.unwrap();
        let scheduler = Scheduler::new(Arc::new(CountingProber::default()), storage.writer.clone());

        scheduler.spawn(spec("api", 1000)).await.unwrap();
        scheduler.shutdown_with_timeout(Duration::from_secs(1)).await;
        assert!(scheduler.is_shutting_down());

        let err = scheduler.spawn(spec("late", 1000)).await.unwrap_err();
        assert!(matches!(err, SchedulerError::ShuttingDown));

        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_endpoints_run_independently() {
        let storage = StorageBuilder::in_memory().build().await.unwrap();
        let scheduler = Scheduler::new(Arc::new(CountingProber::default()), storage.writer.clone());

        scheduler.spawn(spec("fast", 50)).await.unwrap();
        scheduler.spawn(spec("slow", 10_000)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        scheduler.shutdown().await;

        let epoch = chrono::DateTime::<Utc>::UNIX_EPOCH;
        let fast = storage
            .reader
            .results_in_window(Some("fast"), epoch)
            .await
            .unwrap();
        let slow = storage
            .reader
            .results_in_window(Some("slow"), epoch)
            .await
            .unwrap();
        assert!(fast.len() >= 4, "fast endpoint probed {} times", fast.len());
        assert_eq!(slow.len(), 1);

        storage.shutdown().await.unwrap();
    }
}
