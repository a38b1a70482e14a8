//! Configuration module for PingPal.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Database settings (path, writer channel capacity)
//! - Endpoint definitions (name, url, method, interval, timeout)

mod app;
mod endpoint;
mod validation;

pub use app::{AppConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_DB_PATH, DatabaseConfig};
pub use endpoint::EndpointConfig;
pub use validation::{ConfigError, parse_duration};
