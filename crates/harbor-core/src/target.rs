//! Connection target: what to connect to

use serde::Deserialize;
use std::time::Duration;

/// Default connect timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Identifies the database server and database to connect to.
///
/// Immutable once constructed; only accessors are exposed.
///
/// # Example
///
/// ```
/// use harbor_core::ConnectionTarget;
/// use std::time::Duration;
///
/// let target = ConnectionTarget::new("sample", "localhost", 1433);
/// assert_eq!(target.timeout(), Duration::from_secs(30));
///
/// let target = target.with_timeout(Duration::from_secs(5));
/// assert_eq!(target.timeout(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionTarget {
    database: String,
    host: String,
    port: u16,
    #[serde(rename = "timeout_secs", with = "secs", default = "default_timeout")]
    timeout: Duration,
}

impl ConnectionTarget {
    /// Create a target with the default 30 second connect timeout
    pub fn new(database: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            database: database.into(),
            host: host.into(),
            port,
            timeout: default_timeout(),
        }
    }

    /// Return a copy of this target with a different connect timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Connect timeout, passed to the engine as a connect-time option
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

mod secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
