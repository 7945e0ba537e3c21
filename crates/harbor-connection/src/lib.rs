//! Harbor Connection - Resilient connection lifecycle
//!
//! This crate resolves a client driver, connects with retry and exponential
//! backoff, issues transactional sessions and tears everything down again.
//!
//! - [`DriverResolver`] - picks an installed driver from the supported list
//! - [`BackoffPolicy`] - delay between connection attempts
//! - [`ConnectionManager`] - owns the engine handle and its state machine
//! - [`SessionScope`] - commit/rollback/close around one unit of work
//! - [`Lifecycle`] - scoped connect, use, close

mod lifecycle;
mod manager;
mod resolver;
pub mod retry;
mod session;

#[cfg(test)]
mod test_support;

pub use lifecycle::Lifecycle;
pub use manager::{ConnectionManager, ConnectionState};
pub use resolver::DriverResolver;
pub use retry::BackoffPolicy;
pub use session::SessionScope;
