//! Construction-time configuration for the scheduler cache.
//!
//! A flat, `#[derive(Deserialize)]` struct with `#[serde(default)]` fields:
//! callers load it from YAML/JSON alongside their own config, or use
//! `Default` for the documented test values.

use std::time::Duration;

use serde::Deserialize;

fn default_ttl_secs() -> u64 {
    10
}

fn default_sweep_interval_secs() -> u64 {
    2
}

fn default_milli_cpu_request() -> i64 {
    100
}

fn default_memory_request() -> i64 {
    200 * 1024 * 1024
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Assumed-pod expiration window after `FinishBinding`.
    #[serde(default = "default_ttl_secs", rename = "ttl_secs")]
    ttl_secs: u64,

    /// How often the background sweeper runs `cleanup_assumed_pods(now)`.
    /// Must be <= ttl for the bounded-leak guarantee to hold.
    #[serde(default = "default_sweep_interval_secs", rename = "sweep_interval_secs")]
    sweep_interval_secs: u64,

    /// Substituted for a container's CPU request when computing
    /// `nonzeroRequest` if the container declares none.
    #[serde(default = "default_milli_cpu_request")]
    pub default_milli_cpu_request: i64,

    /// Substituted for a container's memory request when computing
    /// `nonzeroRequest` if the container declares none.
    #[serde(default = "default_memory_request")]
    pub default_memory_request: i64,
}

impl CacheConfig {
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            ttl_secs: ttl.as_secs(),
            sweep_interval_secs: sweep_interval.as_secs(),
            ..Self::default()
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval_secs = sweep_interval.as_secs();
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            default_milli_cpu_request: default_milli_cpu_request(),
            default_memory_request: default_memory_request(),
        }
    }
}
