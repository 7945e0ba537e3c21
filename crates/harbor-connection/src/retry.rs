//! Retry policy for connection establishment
//!
//! The connection manager retries transient connect failures, waiting
//! between attempts for the delay computed by a [`BackoffPolicy`].
//!
//! # Example
//!
//! ```
//! use harbor_connection::retry::BackoffPolicy;
//! use std::time::Duration;
//!
//! let backoff = BackoffPolicy::new(100).with_multiplier(3.0);
//! assert_eq!(backoff.delay(2), Duration::from_millis(900));
//! ```

mod backoff;


pub use backoff::BackoffPolicy;
