//! Layered application settings.
//!
//! Sources, later ones winning:
//! 1. built-in defaults,
//! 2. an optional config file (`config/default.{toml,yaml,json}` or an explicit path),
//! 3. `LOYALTY__<SECTION>__<KEY>` environment variables,
//! 4. `ACCRUAL_SYSTEM_ADDRESS` for the accrual address.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Environment variable the accrual address has traditionally been read from.
pub const ACCRUAL_ADDRESS_ENV: &str = "ACCRUAL_SYSTEM_ADDRESS";

const DEFAULT_ADDRESS: &str = "localhost:8080";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 10;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_QUERY_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub accrual: AccrualSettings,
    pub dispatch: DispatchSettings,
}

/// Connection settings for the accrual service.
#[derive(Debug, Clone, Deserialize)]
pub struct AccrualSettings {
    /// `host:port` or a full base URL
    pub address: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Idle connections kept per host
    pub max_idle_connections: usize,
    /// Idle connections are evicted after this many seconds
    pub idle_timeout_secs: u64,
    /// Total attempts per order while rate limited
    pub max_attempts: u32,
}

impl AccrualSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for AccrualSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// What the dispatcher does with sibling workers once one order has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Cancel the batch so waiting and sleeping workers stop early.
    #[default]
    Cancel,
    /// Let every worker run to completion and report all failures.
    Drain,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    /// Maximum concurrent accrual requests per batch
    pub query_limit: usize,
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            query_limit: DEFAULT_QUERY_LIMIT,
            on_failure: FailurePolicy::default(),
        }
    }
}

impl AppConfig {
    /// Loads settings from every source and validates the result.
    ///
    /// Without `path`, `config/default` is read if it exists.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name("config/default").required(false),
        };

        let settings = Config::builder()
            .set_default("accrual.address", DEFAULT_ADDRESS)?
            .set_default("accrual.request_timeout_ms", DEFAULT_REQUEST_TIMEOUT_MS)?
            .set_default(
                "accrual.max_idle_connections",
                DEFAULT_MAX_IDLE_CONNECTIONS as u64,
            )?
            .set_default("accrual.idle_timeout_secs", DEFAULT_IDLE_TIMEOUT_SECS)?
            .set_default("accrual.max_attempts", DEFAULT_MAX_ATTEMPTS as u64)?
            .set_default("dispatch.query_limit", DEFAULT_QUERY_LIMIT as u64)?
            .set_default("dispatch.on_failure", "cancel")?
            .add_source(file)
            .add_source(Environment::with_prefix("LOYALTY").separator("__"))
            .set_override_option("accrual.address", std::env::var(ACCRUAL_ADDRESS_ENV).ok())?
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces the accrual address, e.g. from a command-line flag.
    pub fn with_accrual_address(mut self, address: impl Into<String>) -> Self {
        self.accrual.address = address.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.accrual.address.trim().is_empty() {
            return Err(ConfigError::Message("accrual.address must not be empty".into()));
        }
        if self.accrual.max_attempts == 0 {
            return Err(ConfigError::Message("accrual.max_attempts must be at least 1".into()));
        }
        if self.dispatch.query_limit == 0 {
            return Err(ConfigError::Message("dispatch.query_limit must be at least 1".into()));
        }
        Ok(())
    }
}
