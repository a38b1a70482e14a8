//! HTTP endpoint prober.
//!
//! Measures request latency and classifies the outcome. The response body is
//! never read.

use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::{Client, Method};
use tokio::time::timeout;

use crate::probe::{EndpointSpec, HttpMethod, Prober};
use crate::storage::{CheckResult, ErrorKind};

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Options => Method::OPTIONS,
            HttpMethod::Patch => Method::PATCH,
        }
    }
}

/// HTTP prober backed by one shared connection pool.
///
/// Cloning is cheap and every clone reuses the same [`Client`].
#[derive(Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    /// Build a prober with a fresh client.
    ///
    /// # Errors
    /// Returns the reqwest error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("pingpal/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Build a prober around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for HttpProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProber").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self, spec: &EndpointSpec) -> CheckResult {
        let request = self
            .client
            .request(spec.method.into(), spec.url.as_str())
            .send();

        let started_at = Utc::now();
        let start = Instant::now();
        let outcome = timeout(spec.timeout, request).await;
        let elapsed = start.elapsed();
        let ms = duration_ms(elapsed);

        match outcome {
            Ok(Ok(response)) => {
                let status = response.status().as_u16();
                let result = CheckResult::response(started_at, &spec.name, &spec.url, status, ms);

                if result.ok {
                    tracing::debug!(
                        name = %spec.name,
                        url = %spec.url,
                        latency_ms = ms,
                        status = status,
                        "HTTP probe successful"
                    );
                } else {
                    tracing::warn!(
                        name = %spec.name,
                        url = %spec.url,
                        latency_ms = ms,
                        status = status,
                        "HTTP probe returned failure status"
                    );
                }
                result
            }
            Ok(Err(e)) => {
                let (kind, message, latency) = if e.is_timeout() {
                    let latency = duration_ms(spec.timeout);
                    (ErrorKind::Timeout, timeout_message(spec.timeout), latency)
                } else if e.is_builder() {
                    (ErrorKind::Other, error_chain(&e), ms)
                } else {
                    (ErrorKind::ClientError, error_chain(&e), ms)
                };

                tracing::warn!(
                    name = %spec.name,
                    url = %spec.url,
                    kind = %kind,
                    error = %message,
                    "HTTP probe failed"
                );
                CheckResult::failure(started_at, &spec.name, &spec.url, kind, message, latency)
            }
            Err(_) => {
                tracing::warn!(
                    name = %spec.name,
                    url = %spec.url,
                    timeout_ms = spec.timeout.as_millis(),
                    "HTTP probe timed out"
                );
                CheckResult::failure(
                    started_at,
                    &spec.name,
                    &spec.url,
                    ErrorKind::Timeout,
                    timeout_message(spec.timeout),
                    duration_ms(spec.timeout),
                )
            }
        }
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn timeout_message(limit: Duration) -> String {
    format!("request timed out after {}", humantime::format_duration(limit))
}

/// Render an error followed by its chain of causes.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prober() -> HttpProber {
        HttpProber::new().unwrap()
    }

    #[tokio::test]
    async fn test_probe_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let spec = EndpointSpec::new("svc", format!("{}/health", server.uri()));
        let result = prober().probe(&spec).await;

        assert!(result.ok);
        assert_eq!(result.status_code, Some(200));
        assert!(result.error_kind.is_none());
        assert!(result.error_message.is_none());
        assert!(result.latency_ms >= 0.0);
        assert_eq!(result.name, "svc");
        assert_eq!(result.url, spec.url);
    }

    #[tokio::test]
    async fn test_probe_http_failure_is_not_an_error_kind() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let spec = EndpointSpec::new("svc", server.uri());
        let result = prober().probe(&spec).await;

        assert!(!result.ok);
        assert_eq!(result.status_code, Some(503));
        assert!(result.error_kind.is_none());
    }

    #[tokio::test]
    async fn test_probe_redirect_without_location_counts_as_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(304))
            .mount(&server)
            .await;

        let result = prober().probe(&EndpointSpec::new("svc", server.uri())).await;
        assert!(result.ok);
        assert_eq!(result.status_code, Some(304));
    }

    #[tokio::test]
    async fn test_probe_uses_configured_method() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let spec = EndpointSpec::new("svc", server.uri()).with_method(HttpMethod::Head);
        let result = HttpProber::with_client(Client::new()).probe(&spec).await;
        assert_eq!(result.status_code, Some(204));
    }

    #[tokio::test]
    async fn test_probe_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let spec =
            EndpointSpec::new("slow", server.uri()).with_timeout(Duration::from_millis(300));
        let start = Instant::now();
        let result = prober().probe(&spec).await;

        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(!result.ok);
        assert!(result.status_code.is_none());
        assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
        assert_eq!(
            result.error_message.as_deref(),
            Some("request timed out after 300ms")
        );
        assert_eq!(result.latency_ms, 300.0);
    }

    #[tokio::test]
    async fn test_probe_connection_refused() {
        let spec = EndpointSpec::new("closed", "http://127.0.0.1:9/")
            .with_timeout(Duration::from_secs(1));
        let result = prober().probe(&spec).await;

        assert!(!result.ok);
        assert!(result.status_code.is_none());
        assert_eq!(result.error_kind, Some(ErrorKind::ClientError));
        assert!(!result.error_message.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_probe_unbuildable_request() {
        let spec = EndpointSpec::new("bad", "not a url");
        let result = prober().probe(&spec).await;

        assert!(!result.ok);
        assert!(result.status_code.is_none());
        assert_eq!(result.error_kind, Some(ErrorKind::Other));
    }

    #[test]
    fn test_timeout_message_format() {
        assert_eq!(
            timeout_message(Duration::from_secs(5)),
            "request timed out after 5s"
        );
    }
}
