//! Transactional sessions over a shared tiberius client

use async_trait::async_trait;
use harbor_core::{HarborError, Result, Session, SessionFactory, StatementOutcome};
use tokio::sync::OwnedMutexGuard;

use crate::engine::{MssqlClient, SharedClient};
use crate::error::MssqlEngineError;

/// Clears any transaction a dropped session left behind, then opens a new one
const BEGIN_TRANSACTION: &str = "IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION; BEGIN TRANSACTION";
const COMMIT_TRANSACTION: &str = "COMMIT TRANSACTION";
const ROLLBACK_TRANSACTION: &str = "IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION";

/// Creates sessions on the handle's connection.
///
/// A TDS connection carries one transaction at a time, so a session holds
/// the connection exclusively from creation until it is closed or dropped.
/// Creating a second session while one is open fails instead of waiting.
pub struct MssqlSessionFactory {
    client: SharedClient,
}

impl MssqlSessionFactory {
    pub(crate) fn new(client: SharedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionFactory for MssqlSessionFactory {
    async fn create_session(&self) -> Result<Box<dyn Session>> {
        let guard = self.client.clone().try_lock_owned().map_err(|_| {
            HarborError::Session("connection busy: another session is open".into())
        })?;
        let mut session = MssqlSession {
            guard: Some(guard),
            in_transaction: false,
        };

        session.run_batch(BEGIN_TRANSACTION).await?;
        session.in_transaction = true;
        tracing::debug!("transaction started");

        Ok(Box::new(session))
    }
}

/// One explicit transaction on the shared connection
pub struct MssqlSession {
    guard: Option<OwnedMutexGuard<Option<MssqlClient>>>,
    in_transaction: bool,
}

impl MssqlSession {
    fn client(&mut self) -> std::result::Result<&mut MssqlClient, MssqlEngineError> {
        self.guard
            .as_mut()
            .and_then(|guard| guard.as_mut())
            .ok_or(MssqlEngineError::ConnectionClosed)
    }

    async fn run_batch(&mut self, batch: &str) -> std::result::Result<(), MssqlEngineError> {
        self.client()?
            .simple_query(batch)
            .await?
            .into_results()
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Session for MssqlSession {
    async fn execute(&mut self, statement: &str) -> Result<StatementOutcome> {
        let start = std::time::Instant::now();
        let result = self
            .client()?
            .execute(statement, &[])
            .await
            .map_err(MssqlEngineError::from)?;

        let affected_rows = result.rows_affected().iter().sum::<u64>();
        tracing::debug!(
            affected_rows = affected_rows,
            duration_ms = start.elapsed().as_millis() as u64,
            "execute completed"
        );
        Ok(StatementOutcome::new(affected_rows))
    }

    async fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            self.run_batch(COMMIT_TRANSACTION).await?;
            self.in_transaction = false;
            tracing::debug!("transaction committed");
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.in_transaction {
            // the transaction is gone whether or not the batch succeeds
            self.in_transaction = false;
            self.run_batch(ROLLBACK_TRANSACTION).await?;
            tracing::debug!("transaction rolled back");
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let outcome = self.rollback().await;
        // releases the connection for the next session
        self.guard = None;
        outcome
    }

    fn abort(&mut self) {
        if self.in_transaction {
            tracing::warn!("session aborted with an open transaction; it is rolled back by the next session");
            self.in_transaction = false;
        }
        self.guard = None;
    }
}

impl Drop for MssqlSession {
    fn drop(&mut self) {
        self.abort();
    }
}
