//! Exponential backoff calculator for connection retry
//!
//! Pure function of the attempt index: `initial * multiplier^attempt`,
//! optionally capped.

use harbor_core::BackoffConfig;
use std::time::Duration;

/// Exponential backoff policy for connection retries.
///
/// Calculates delays that grow exponentially with each attempt. The policy
/// is stateless and side-effect free; the connection manager asks it for
/// the delay between two attempts and does the waiting itself.
///
/// # Example
///
/// ```
/// use harbor_connection::BackoffPolicy;
/// use std::time::Duration;
///
/// let backoff = BackoffPolicy::default();
///
/// // First retry waits the initial delay
/// assert_eq!(backoff.delay(0), Duration::from_secs(1));
///
/// // Then doubles
/// assert_eq!(backoff.delay(1), Duration::from_secs(2));
/// assert_eq!(backoff.delay(2), Duration::from_secs(4));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay in milliseconds before the first retry
    initial_ms: u64,
    /// Multiplier for exponential growth (default: 2.0)
    multiplier: f64,
    /// Optional cap in milliseconds
    max_ms: Option<u64>,
}

impl BackoffPolicy {
    /// Create a policy with the given initial delay and a multiplier of 2
    pub fn new(initial_ms: u64) -> Self {
        Self {
            initial_ms,
            multiplier: 2.0,
            max_ms: None,
        }
    }

    /// Build a policy from configuration
    pub fn from_config(config: &BackoffConfig) -> Self {
        let policy = Self::new(config.initial_delay_ms).with_multiplier(config.factor);
        match config.max_delay_ms {
            Some(max_ms) => policy.with_max_delay_ms(max_ms),
            None => policy,
        }
    }

    /// Set the multiplier for exponential growth.
    ///
    /// Values below 1.0 (and NaN) are clamped to 1.0 so delays never shrink.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = if multiplier >= 1.0 { multiplier } else { 1.0 };
        self
    }

    /// Cap every delay at `max_ms` milliseconds
    pub fn with_max_delay_ms(mut self, max_ms: u64) -> Self {
        self.max_ms = Some(max_ms.max(self.initial_ms));
        self
    }

    /// Calculate the delay to wait after the given failed attempt.
    ///
    /// `attempt` is zero-based, so `delay(0)` is the initial delay.
    /// Very large attempts saturate rather than overflow.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let delay_ms = (self.initial_ms as f64) * self.multiplier.powi(exponent);

        let capped_ms = match self.max_ms {
            Some(max_ms) => delay_ms.min(max_ms as f64),
            None => delay_ms,
        };

        // `as` saturates for values beyond u64::MAX
        Duration::from_millis(capped_ms as u64)
    }

    /// Get the initial delay.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    /// Get the cap, if any.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_ms.map(Duration::from_millis)
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

impl Default for BackoffPolicy {
    /// Default backoff: 1 second initial, 2x multiplier, no cap
    fn default() -> Self {
        Self::from_config(&BackoffConfig::default())
    }
}
