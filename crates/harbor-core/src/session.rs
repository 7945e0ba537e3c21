//! Session traits: units of work bound to a live connection

use crate::Result;
use async_trait::async_trait;

/// Outcome of a single statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementOutcome {
    /// Number of rows affected, summed over all result sets
    pub affected_rows: u64,
}

impl StatementOutcome {
    pub fn new(affected_rows: u64) -> Self {
        Self { affected_rows }
    }
}

/// Constructs new sessions from a live engine handle
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Create a new session with its own unit of work
    async fn create_session(&self) -> Result<Box<dyn Session>>;
}

/// A transactional unit of work.
///
/// Statements are opaque to Harbor; they are passed through to the engine
/// unchanged. Implementations should release their resources when dropped
/// without `close` having been called.
#[async_trait]
pub trait Session: Send {
    /// Execute a statement within the unit of work
    async fn execute(&mut self, statement: &str) -> Result<StatementOutcome>;

    /// Commit the unit of work
    async fn commit(&mut self) -> Result<()>;

    /// Roll back the unit of work
    async fn rollback(&mut self) -> Result<()>;

    /// Release the session
    async fn close(&mut self) -> Result<()>;

    /// Release the session without waiting on the server.
    ///
    /// Called when a session is dropped before its unit of work finished.
    /// Any open transaction must not be committed.
    fn abort(&mut self);
}
