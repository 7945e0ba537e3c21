//! Lifecycle configuration
//!
//! Retry budget, backoff parameters and the supported driver list, loadable
//! from TOML with environment overrides:
//!
//! ```toml
//! max_retries = 5
//! supported_drivers = ["ODBC Driver 18 for SQL Server", "ODBC Driver 17 for SQL Server"]
//!
//! [backoff]
//! initial_delay_ms = 500
//! factor = 3.0
//! ```

use crate::{DEFAULT_DIALECT, DEFAULT_SUPPORTED_DRIVERS, HarborError, Result, SupportedDrivers};
use serde::Deserialize;
use std::path::Path;


/// Environment variable overriding `max_retries`
pub const ENV_MAX_RETRIES: &str = "HARBOR_MAX_RETRIES";
/// Environment variable overriding `supported_drivers` (`;`-separated)
pub const ENV_SUPPORTED_DRIVERS: &str = "HARBOR_SUPPORTED_DRIVERS";

/// Default number of connection attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Backoff parameters between connection attempts
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u64,
    /// Multiplier applied per attempt
    pub factor: f64,
    /// Optional cap on a single delay, in milliseconds
    pub max_delay_ms: Option<u64>,
}

impl Default for BackoffConfig {
    /// 1 second initial delay doubling on every attempt, uncapped
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            factor: 2.0,
            max_delay_ms: None,
        }
    }
}

/// Configuration for a connection lifecycle
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Supported driver names in priority order
    pub supported_drivers: Vec<String>,
    /// Total number of connection attempts (at least one is always made)
    pub max_retries: u32,
    /// Dialect prefix of the connection descriptor
    pub dialect: String,
    pub backoff: BackoffConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            supported_drivers: DEFAULT_SUPPORTED_DRIVERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_retries: DEFAULT_MAX_RETRIES,
            dialect: DEFAULT_DIALECT.to_string(),
            backoff: BackoffConfig::default(),
        }
    }
}

impl LifecycleConfig {
    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| HarborError::Configuration(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!("loading lifecycle configuration");
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarborError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `HARBOR_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` to read variables
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_RETRIES) {
            self.max_retries = value.trim().parse().map_err(|_| {
                HarborError::Configuration(format!(
                    "{ENV_MAX_RETRIES} must be a non-negative integer, got {value:?}"
                ))
            })?;
            tracing::debug!(max_retries = self.max_retries, "max_retries overridden from environment");
        }

        if let Some(value) = lookup(ENV_SUPPORTED_DRIVERS) {
            self.supported_drivers = value
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            tracing::debug!(drivers = ?self.supported_drivers, "supported drivers overridden from environment");
        }

        self.validate()?;
        Ok(self)
    }

    /// Supported drivers as a deduplicated priority list
    pub fn supported(&self) -> SupportedDrivers {
        SupportedDrivers::new(self.supported_drivers.iter().cloned())
    }

    /// Effective attempt budget (never below one)
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    fn validate(&self) -> Result<()> {
        if self.supported().is_empty() {
            return Err(HarborError::Configuration(
                "supported_drivers must name at least one driver".into(),
            ));
        }
        if !self.backoff.factor.is_finite() {
            return Err(HarborError::Configuration(
                "backoff.factor must be a finite number".into(),
            ));
        }
        if self.dialect.trim().is_empty() {
            return Err(HarborError::Configuration("dialect must not be empty".into()));
        }
        Ok(())
    }
}
