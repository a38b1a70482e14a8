//! Probe executor.
//!
//! A probe performs exactly one HTTP request against an endpoint and turns the
//! outcome into a [`CheckResult`](crate::storage::CheckResult). Failures are data,
//! not errors: every invocation yields a result.
//!
//! - [`Prober`]: async seam used by the scheduler
//! - [`HttpProber`]: reqwest implementation sharing a single pooled client
//! - [`EndpointSpec`] / [`HttpMethod`]: what to probe and how

mod http;
mod traits;

pub use http::HttpProber;
pub use traits::{DEFAULT_INTERVAL, DEFAULT_TIMEOUT, EndpointSpec, HttpMethod, Prober};
