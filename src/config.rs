use crate::error::{Result, RouterError};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration. Every option can also be set from the environment.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct RouterConfig {
    /// Base URL of the default payment processor
    #[arg(long, env = "PAYMENT_PROCESSOR_URL_DEFAULT")]
    pub default_url: String,

    /// Base URL of the fallback payment processor
    #[arg(long, env = "PAYMENT_PROCESSOR_URL_FALLBACK")]
    pub fallback_url: String,

    /// Address the HTTP surface listens on
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:9999")]
    pub bind: SocketAddr,

    /// Number of concurrent payment workers
    #[arg(long, env = "CHANNEL_CONSUMER", default_value_t = 16)]
    pub workers: usize,

    /// Capacity of the work queue
    #[arg(long, env = "CHANNEL_BUFFER", default_value_t = 10_000)]
    pub queue_capacity: usize,

    /// Interval between health polling rounds, in milliseconds
    #[arg(long, env = "HEALTH_INTERVAL_MS", default_value_t = 5_000)]
    pub health_interval_ms: u64,

    /// Default processor latency above which traffic moves to the fallback, in milliseconds
    #[arg(long, env = "LATENCY_THRESHOLD_MS", default_value_t = 100)]
    pub latency_threshold_ms: u64,

    /// Timeout of a single payment submission, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 2_000)]
    pub request_timeout_ms: u64,

    /// Timeout of a single health probe, in milliseconds
    #[arg(long, env = "HEALTH_TIMEOUT_MS", default_value_t = 1_000)]
    pub health_timeout_ms: u64,

    /// Give up on a payment after this many failed delivery attempts (unbounded if unset)
    #[arg(long, env = "MAX_ATTEMPTS")]
    pub max_attempts: Option<u32>,

    /// Path to persistent ledger (optional). If provided, uses RocksDB.
    #[arg(long, env = "DB_PATH")]
    pub db_path: Option<PathBuf>,
}

impl RouterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(RouterError::Validation(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity <= self.workers {
            return Err(RouterError::Validation(format!(
                "queue capacity ({}) must exceed the worker count ({})",
                self.queue_capacity, self.workers
            )));
        }
        let durations = [
            ("health interval", self.health_interval_ms),
            ("request timeout", self.request_timeout_ms),
            ("health timeout", self.health_timeout_ms),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, ms)| *ms == 0) {
            return Err(RouterError::Validation(format!("{name} must be positive")));
        }
        if self.max_attempts == Some(0) {
            return Err(RouterError::Validation(
                "max attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }

    pub fn latency_threshold(&self) -> Duration {
        Duration::from_millis(self.latency_threshold_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }
}
