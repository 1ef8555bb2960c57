//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::tasks::SweepConfig;

/// Connection settings for the MinIO / S3 backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinioConfig {
    /// Host and port of the object store, without scheme
    pub endpoint: String,
    /// Access key; empty means anonymous requests
    pub access_key: String,
    /// Secret key paired with `access_key`
    pub secret_key: String,
    /// Use https instead of http
    pub use_ssl: bool,
    /// Bucket holding the served files
    pub bucket: String,
    /// Region used in request signatures
    pub region: String,
    /// Timeout for a single object download in seconds
    pub request_timeout: u64,
}

impl Default for MinioConfig {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:9000".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            use_ssl: false,
            bucket: "my-first-bucket".to_string(),
            region: "us-east-1".to_string(),
            request_timeout: 30,
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Idle seconds after which a cached file expires
    pub cache_ttl: u64,
    /// Seconds between two expiration sweeps
    pub sweep_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Seconds allowed for graceful shutdown
    pub shutdown_timeout: u64,
    /// Backing store settings
    pub minio: MinioConfig,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL` - Idle TTL in seconds (default: 5)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: `CACHE_TTL`)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `SHUTDOWN_TIMEOUT` - Graceful shutdown limit in seconds (default: 10)
    /// - `MINIO_ENDPOINT` - Object store host:port (default: 127.0.0.1:9000)
    /// - `MINIO_ACCESS_KEY` / `MINIO_SECRET_KEY` - Credentials (default: anonymous)
    /// - `MINIO_USE_SSL` - Use https (default: false)
    /// - `MINIO_BUCKET` - Bucket name (default: my-first-bucket)
    /// - `MINIO_REGION` - Signing region (default: us-east-1)
    /// - `MINIO_TIMEOUT` - Download timeout in seconds (default: 30)
    ///
    /// Zero TTL and interval values are raised to one second.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cache_ttl = env_or("CACHE_TTL", defaults.cache_ttl).max(1);
        let sweep_interval = env_or("SWEEP_INTERVAL", cache_ttl).max(1);

        Self {
            cache_ttl,
            sweep_interval,
            server_port: env_or("SERVER_PORT", defaults.server_port),
            shutdown_timeout: env_or("SHUTDOWN_TIMEOUT", defaults.shutdown_timeout),
            minio: MinioConfig {
                endpoint: env_string("MINIO_ENDPOINT", &defaults.minio.endpoint),
                access_key: env::var("MINIO_ACCESS_KEY").unwrap_or_default(),
                secret_key: env::var("MINIO_SECRET_KEY").unwrap_or_default(),
                use_ssl: env_or("MINIO_USE_SSL", defaults.minio.use_ssl),
                bucket: env_string("MINIO_BUCKET", &defaults.minio.bucket),
                region: env_string("MINIO_REGION", &defaults.minio.region),
                request_timeout: env_or("MINIO_TIMEOUT", defaults.minio.request_timeout),
            },
        }
    }

    /// Sweeper timing derived from this config.
    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig::new(Duration::from_secs(self.cache_ttl))
            .with_interval(Duration::from_secs(self.sweep_interval))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl: 5,
            sweep_interval: 5,
            server_port: 8080,
            shutdown_timeout: 10,
            minio: MinioConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: &[&str] = &[
        "CACHE_TTL",
        "SWEEP_INTERVAL",
        "SERVER_PORT",
        "SHUTDOWN_TIMEOUT",
        "MINIO_ENDPOINT",
        "MINIO_ACCESS_KEY",
        "MINIO_SECRET_KEY",
        "MINIO_USE_SSL",
        "MINIO_BUCKET",
        "MINIO_REGION",
        "MINIO_TIMEOUT",
    ];

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_ttl, 5);
        assert_eq!(config.sweep_interval, 5);
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.minio.endpoint, "127.0.0.1:9000");
        assert_eq!(config.minio.bucket, "my-first-bucket");
        assert!(!config.minio.use_ssl);
    }

    // Environment is process-global, so every env-dependent assertion lives
    // in this one test.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }
        assert_eq!(Config::from_env(), Config::default());

        env::set_var("CACHE_TTL", "30");
        env::set_var("MINIO_USE_SSL", "not-a-bool");
        env::set_var("MINIO_BUCKET", "assets");
        let config = Config::from_env();
        assert_eq!(config.cache_ttl, 30);
        assert_eq!(config.sweep_interval, 30, "interval follows TTL unless set");
        assert!(!config.minio.use_ssl);
        assert_eq!(config.minio.bucket, "assets");

        env::set_var("SWEEP_INTERVAL", "0");
        env::set_var("MINIO_USE_SSL", "true");
        let config = Config::from_env();
        assert_eq!(config.sweep_interval, 1);
        assert!(config.minio.use_ssl);

        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_sweep_config() {
        let config = Config {
            cache_ttl: 2,
            sweep_interval: 1,
            ..Config::default()
        };
        let sweep = config.sweep_config();
        assert_eq!(sweep.ttl, Duration::from_secs(2));
        assert_eq!(sweep.interval, Duration::from_secs(1));
    }
}
