use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default number of series buckets retained per host.
pub const DEFAULT_SERIES_NUM: usize = 8;

/// Default grace period before a forced pool close, in milliseconds.
pub const DEFAULT_CLOSE_DEADLINE_MS: u64 = 10_000;

/// Default decay tick period, in milliseconds.
pub const DEFAULT_DECAY_INTERVAL_MS: u64 = 30_000;

/// Default bound on connection acquisition attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Connection pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSettings {
    /// Maximum number of connections checked out per host
    #[serde(default = "default_max_conns")]
    pub max_conns: u32,

    /// Maximum number of idle connections kept for reuse
    #[serde(default = "default_max_idle_conns")]
    pub max_idle_conns: usize,

    /// Dial timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum idle time before a pooled connection is discarded, in milliseconds
    #[serde(default = "default_max_idle_time_ms")]
    pub max_idle_time_ms: u64,
}

fn default_max_conns() -> u32 {
    32
}

fn default_max_idle_conns() -> usize {
    8
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_max_idle_time_ms() -> u64 {
    90_000
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_conns: default_max_conns(),
            max_idle_conns: default_max_idle_conns(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_idle_time_ms: default_max_idle_time_ms(),
        }
    }
}

impl PoolSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn max_idle_time(&self) -> Duration {
        Duration::from_millis(self.max_idle_time_ms)
    }
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Number of series buckets retained per host (> 0)
    #[serde(default = "default_series_num")]
    pub series_num: usize,

    /// Grace period before a forced pool close, in milliseconds
    #[serde(default = "default_close_deadline_ms")]
    pub close_deadline_ms: u64,

    /// Decay tick period in milliseconds (> 0)
    #[serde(default = "default_decay_interval_ms")]
    pub decay_interval_ms: u64,

    /// Maximum connection acquisition attempts per call (> 0)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Selection strategy: round_robin, epsilon_greedy, softmax
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Per-host connection pool settings
    #[serde(default)]
    pub pool: PoolSettings,
}

fn default_series_num() -> usize {
    DEFAULT_SERIES_NUM
}

fn default_close_deadline_ms() -> u64 {
    DEFAULT_CLOSE_DEADLINE_MS
}

fn default_decay_interval_ms() -> u64 {
    DEFAULT_DECAY_INTERVAL_MS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_strategy() -> String {
    "round_robin".to_string()
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            series_num: default_series_num(),
            close_deadline_ms: default_close_deadline_ms(),
            decay_interval_ms: default_decay_interval_ms(),
            max_attempts: default_max_attempts(),
            strategy: default_strategy(),
            pool: PoolSettings::default(),
        }
    }
}

impl ServiceSettings {
    pub fn close_deadline(&self) -> Duration {
        Duration::from_millis(self.close_deadline_ms)
    }

    pub fn decay_interval(&self) -> Duration {
        Duration::from_millis(self.decay_interval_ms)
    }

    /// Validate invariants that serde defaults alone cannot enforce
    pub fn validate(&self) -> Result<()> {
        if self.series_num == 0 {
            anyhow::bail!("series_num must be greater than zero");
        }
        if self.decay_interval_ms == 0 {
            anyhow::bail!("decay_interval_ms must be greater than zero");
        }
        if self.max_attempts == 0 {
            anyhow::bail!("max_attempts must be greater than zero");
        }
        Ok(())
    }
}

/// Load settings from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<ServiceSettings> {
    let content = std::fs::read_to_string(path.as_ref())
        .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

    let settings: ServiceSettings =
        serde_yaml::from_str(&content).context("Failed to parse YAML configuration")?;

    settings.validate()?;
    Ok(settings)
}

/// Load settings from environment variables
///
/// Recognized variables, all optional:
/// - POOLMUX_SERIES_NUM
/// - POOLMUX_CLOSE_DEADLINE_MS
/// - POOLMUX_DECAY_INTERVAL_MS
/// - POOLMUX_MAX_ATTEMPTS
/// - POOLMUX_STRATEGY (round_robin, epsilon_greedy, softmax)
/// - POOLMUX_POOL_MAX_CONNS
/// - POOLMUX_POOL_CONNECT_TIMEOUT_MS
pub fn load_from_env() -> Result<ServiceSettings> {
    // Pick up a .env file when present (don't fail if it doesn't exist)
    let _ = dotenvy::dotenv();

    let mut settings = ServiceSettings::default();

    if let Ok(num) = std::env::var("POOLMUX_SERIES_NUM") {
        settings.series_num = num
            .parse()
            .context("POOLMUX_SERIES_NUM is not a valid integer")?;
    }

    if let Ok(ms) = std::env::var("POOLMUX_CLOSE_DEADLINE_MS") {
        settings.close_deadline_ms = ms
            .parse()
            .context("POOLMUX_CLOSE_DEADLINE_MS is not a valid integer")?;
    }

    if let Ok(ms) = std::env::var("POOLMUX_DECAY_INTERVAL_MS") {
        settings.decay_interval_ms = ms
            .parse()
            .context("POOLMUX_DECAY_INTERVAL_MS is not a valid integer")?;
    }

    if let Ok(attempts) = std::env::var("POOLMUX_MAX_ATTEMPTS") {
        settings.max_attempts = attempts
            .parse()
            .context("POOLMUX_MAX_ATTEMPTS is not a valid integer")?;
    }

    if let Ok(strategy) = std::env::var("POOLMUX_STRATEGY") {
        settings.strategy = strategy;
    }

    if let Ok(conns) = std::env::var("POOLMUX_POOL_MAX_CONNS") {
        settings.pool.max_conns = conns
            .parse()
            .context("POOLMUX_POOL_MAX_CONNS is not a valid integer")?;
    }

    if let Ok(ms) = std::env::var("POOLMUX_POOL_CONNECT_TIMEOUT_MS") {
        settings.pool.connect_timeout_ms = ms
            .parse()
            .context("POOLMUX_POOL_CONNECT_TIMEOUT_MS is not a valid integer")?;
    }

    settings.validate()?;
    Ok(settings)
}

/// Load settings from a file when a path is given, otherwise from the environment
pub fn load_config(config_path: Option<&str>) -> Result<ServiceSettings> {
    match config_path {
        Some(path) => load_from_yaml(path),
        None => load_from_env(),
    }
}
