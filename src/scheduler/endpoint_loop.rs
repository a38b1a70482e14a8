//! Per-endpoint probe loop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::probe::{EndpointSpec, Prober};
use crate::storage::HistoryWriter;

/// Log target for the one-line probe summaries.
pub(crate) const PROBE_LOG_TARGET: &str = "pingpal::probe";

/// Probe `spec` forever, until `cancel` fires.
///
/// The first probe starts immediately. After each probe the result is appended
/// to the history and logged, then the loop sleeps for `spec.interval`, so the
/// effective period is probe latency plus interval. A probe still in flight
/// when `cancel` fires is dropped without being persisted. Persistence
/// failures are logged and the loop carries on.
pub async fn run_endpoint(
    spec: EndpointSpec,
    prober: Arc<dyn Prober>,
    writer: HistoryWriter,
    cancel: CancellationToken,
) {
    tracing::info!(
        endpoint = %spec.name,
        url = %spec.url,
        interval = %humantime::format_duration(spec.interval),
        "Endpoint loop started"
    );

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = prober.probe(&spec) => result,
        };

        if let Err(e) = writer.append(result.clone()).await {
            tracing::error!(endpoint = %spec.name, error = %e, "Failed to persist check result");
        }
        tracing::info!(target: PROBE_LOG_TARGET, "{result}");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(spec.interval) => {}
        }
    }

    tracing::info!(endpoint = %spec.name, "Endpoint loop stopped");
}
