//! Environment-driven configuration for the trigger and the table sink.
//!
//! `Default` reads the process environment (after `dotenv` has run in the
//! binary) and falls back to the values below.

use std::time::Duration;

pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";
pub const DEFAULT_STREAM: &str = "AISQUICK";
pub const DEFAULT_TOPIC: &str = "aisquick-sample";
pub const DEFAULT_SUBSCRIPTION: &str = "function-app";
pub const DEFAULT_TABLE: &str = "aisquick_sample";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

/// Where messages come from and how they are pulled
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub nats_url: String,
    pub stream_name: String,
    /// Subject the sample topic publishes on
    pub topic: String,
    /// Durable consumer name
    pub subscription: String,
    pub max_deliver: i64,
    pub batch_size: usize,
    pub poll_interval: Duration,
    pub max_age: Duration,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            nats_url: env_or("NATS_URL", DEFAULT_NATS_URL),
            stream_name: env_or("NATS_STREAM", DEFAULT_STREAM),
            topic: env_or("SAMPLE_TOPIC", DEFAULT_TOPIC),
            subscription: env_or("SAMPLE_SUBSCRIPTION", DEFAULT_SUBSCRIPTION),
            max_deliver: env_parse("MAX_DELIVER", 3),
            batch_size: env_parse("BATCH_SIZE", 10),
            poll_interval: Duration::from_millis(env_parse("POLL_INTERVAL_MS", 100)),
            max_age: Duration::from_secs(24 * 60 * 60), // 24 hours
        }
    }
}

/// Where rows go
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub database_url: Option<String>,
    pub table_name: String,
    pub max_connections: u32,
    pub min_idle: u32,
    pub connection_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            database_url: std::env::var("DATABASE_URL").ok(),
            table_name: env_or("SAMPLE_TABLE", DEFAULT_TABLE),
            max_connections: 15,      // Max connections in pool
            min_idle: 5,              // Keep minimum idle connections
            connection_timeout_secs: 30,  // Wait up to 30s for connection
            idle_timeout_secs: 600,   // Close idle connections after 10 min
            max_lifetime_secs: 1800,  // Recycle connections after 30 min
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        std::env::set_var("AISQUICK_TEST_BATCH", "not-a-number");
        assert_eq!(env_parse("AISQUICK_TEST_BATCH", 10usize), 10);

        std::env::set_var("AISQUICK_TEST_BATCH", "25");
        assert_eq!(env_parse("AISQUICK_TEST_BATCH", 10usize), 25);
        std::env::remove_var("AISQUICK_TEST_BATCH");
    }

    #[test]
    fn test_env_or_default() {
        assert_eq!(env_or("AISQUICK_TEST_UNSET_VAR", "fallback"), "fallback");
    }

    #[test]
    fn test_pool_defaults() {
        let config = TableConfig::default();
        assert_eq!(config.max_connections, 15);
        assert_eq!(config.min_idle, 5);
    }
}
