//! End-to-end tests for PingPal
//!
//! Drive the supervisor and scheduler against real sockets and a file-backed
//! history, then inspect what was persisted.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pingpal::{
    AppConfig, EndpointSpec, ErrorKind, HttpProber, MonitorConfig, Scheduler, StorageBuilder,
    Supervisor,
};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Helpers
// =============================================================================

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

// =============================================================================
// Supervisor
// =============================================================================

#[tokio::test]
async fn test_closed_port_is_recorded_as_client_error() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("pingpal.db");

    let monitor = MonitorConfig {
        endpoints: vec![
            EndpointSpec::new("svc", "http://127.0.0.1:9/")
                .with_interval(Duration::from_secs(1))
                .with_timeout(Duration::from_secs(1)),
        ],
        db_path: db_path.clone(),
        channel_capacity: 64,
        shutdown_timeout: Duration::from_secs(2),
    };

    Supervisor::new(monitor)
        .run(tokio::time::sleep(Duration::from_secs(3)))
        .await
        .unwrap();

    let storage = StorageBuilder::new(&db_path).build().await.unwrap();
    let rows = storage
        .reader
        .results_in_window(Some("svc"), epoch())
        .await
        .unwrap();

    assert!(rows.len() >= 2, "expected at least 2 rows, got {}", rows.len());
    for row in &rows {
        assert!(!row.result.ok);
        assert!(row.result.status_code.is_none());
        assert_eq!(row.result.error_kind, Some(ErrorKind::ClientError));
        assert_eq!(row.result.url, "http://127.0.0.1:9/");
    }
    assert!(rows.windows(2).all(|w| w[0].id < w[1].id));

    storage.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_supervisor_from_yaml_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let db_path = dir.path().join("data").join("history.db");
    let yaml = format!(
        "database:\n  path: {}\nendpoints:\n  - name: health\n    url: {}/health\n    interval: 200ms\n    timeout: 1s\n",
        db_path.display(),
        server.uri()
    );
    let config = AppConfig::from_yaml_str(&yaml).unwrap();
    let monitor = MonitorConfig::from_app_config(&config).unwrap();

    Supervisor::new(monitor)
        .run(tokio::time::sleep(Duration::from_millis(700)))
        .await
        .unwrap();

    let storage = StorageBuilder::new(&db_path).build().await.unwrap();
    let latest = storage.reader.latest_per_endpoint().await.unwrap();
    let health = &latest["health"].result;
    assert!(health.ok);
    assert_eq!(health.status_code, Some(200));

    let stats = storage.reader.window_stats(None, epoch()).await.unwrap();
    assert!(stats.total >= 2);
    assert_eq!(stats.uptime_percent, 100.0);

    storage.shutdown().await.unwrap();
}

// =============================================================================
// Scheduler + HTTP prober
// =============================================================================

#[tokio::test]
async fn test_concurrent_endpoints_with_mixed_outcomes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let storage = StorageBuilder::in_memory().build().await.unwrap();
    let prober = Arc::new(HttpProber::new().unwrap());
    let scheduler = Scheduler::new(prober, storage.writer.clone());

    let every = Duration::from_millis(150);
    for (name, route) in [("up", "/up"), ("down", "/down"), ("slow", "/slow")] {
        let spec = EndpointSpec::new(name, format!("{}{route}", server.uri()))
            .with_interval(every)
            .with_timeout(Duration::from_millis(300));
        scheduler.spawn(spec).await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(1000)).await;
    scheduler.shutdown().await;

    let reader = &storage.reader;
    let up = reader.results_in_window(Some("up"), epoch()).await.unwrap();
    let down = reader
        .results_in_window(Some("down"), epoch())
        .await
        .unwrap();
    let slow = reader
        .results_in_window(Some("slow"), epoch())
        .await
        .unwrap();

    assert!(up.len() >= 3);
    assert!(up.iter().all(|r| r.result.ok && r.result.status_code == Some(200)));

    assert!(down.len() >= 3);
    assert!(down.iter().all(|r| {
        !r.result.ok && r.result.status_code == Some(503) && r.result.error_kind.is_none()
    }));

    // Each slow probe takes the full timeout, so it runs far fewer times.
    assert!(!slow.is_empty());
    assert!(slow.len() < up.len());
    for r in &slow {
        assert_eq!(r.result.error_kind, Some(ErrorKind::Timeout));
        assert!(r.result.status_code.is_none());
        assert_eq!(r.result.latency_ms, 300.0);
        assert_eq!(
            r.result.error_message.as_deref(),
            Some("request timed out after 300ms")
        );
    }

    let names = reader.endpoint_names().await.unwrap();
    assert_eq!(names, ["down", "slow", "up"]);

    storage.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_history_survives_restart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let db_path = dir.path().join("history.db");

    let mut counts = Vec::new();
    for _ in 0..2 {
        let storage = StorageBuilder::new(&db_path).build().await.unwrap();
        let scheduler = Scheduler::with_http(storage.writer.clone()).unwrap();
        scheduler
            .spawn(EndpointSpec::new("api", server.uri()).with_interval(Duration::from_secs(60)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        scheduler.shutdown().await;

        let rows = storage
            .reader
            .results_in_window(Some("api"), epoch())
            .await
            .unwrap();
        counts.push(rows.len());
        storage.shutdown().await.unwrap();
    }

    assert_eq!(counts, [1, 2]);
}
