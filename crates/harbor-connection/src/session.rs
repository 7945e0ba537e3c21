//! Scoped sessions
//!
//! A [`SessionScope`] wraps one session drawn from a connected manager and
//! guarantees its unit of work is finished exactly once: committed when the
//! work succeeds, rolled back when it fails, and closed either way.

use std::fmt;

use harbor_core::{EventSink, HarborError, LifecycleEvent, Session};
use uuid::Uuid;


/// One session bound to a connected [`ConnectionManager`](crate::ConnectionManager).
///
/// Borrows the manager, so the connection cannot be closed while the scope
/// is alive. A scope dropped before [`run`](Self::run) completes, including
/// a cancelled `run`, aborts its session instead of committing it.
pub struct SessionScope<'a> {
    session: Box<dyn Session>,
    events: &'a dyn EventSink,
    manager_id: Uuid,
    finished: bool,
}

impl<'a> SessionScope<'a> {
    pub(crate) fn new(session: Box<dyn Session>, events: &'a dyn EventSink, manager_id: Uuid) -> Self {
        Self {
            session,
            events,
            manager_id,
            finished: false,
        }
    }

    /// Run `body` as the unit of work of this session.
    ///
    /// If `body` succeeds the session is committed; a failing commit is
    /// handled like a failing body. On failure the session is rolled back
    /// and the original error is returned unchanged. The session is closed
    /// exactly once on every path. Rollback and close failures are reported
    /// as events and never replace the error being returned.
    pub async fn run<T, E, F>(mut self, body: F) -> Result<T, E>
    where
        F: AsyncFnOnce(&mut dyn Session) -> Result<T, E>,
        E: From<HarborError> + fmt::Display,
    {
        let outcome = match body(self.session.as_mut()).await {
            Ok(value) => match self.session.commit().await {
                Ok(()) => Ok(value),
                Err(err) => Err(E::from(err)),
            },
            Err(err) => Err(err),
        };

        if let Err(err) = &outcome {
            self.roll_back(err).await;
        }

        self.release().await;
        self.finished = true;
        outcome
    }

    async fn roll_back(&mut self, cause: &dyn fmt::Display) {
        if let Err(rollback_err) = self.session.rollback().await {
            self.emit(
                LifecycleEvent::error(format!("Database session rollback failed: {rollback_err}"))
                    .with("cause", cause),
            );
        }
        self.emit(LifecycleEvent::error(format!(
            "Database session failed to commit: {cause}"
        )));
    }

    async fn release(&mut self) {
        match self.session.close().await {
            Ok(()) => tracing::debug!(manager_id = %self.manager_id, "session closed"),
            Err(err) => self.emit(LifecycleEvent::error(format!(
                "Failed to close database session: {err}"
            ))),
        }
    }

    fn emit(&self, event: LifecycleEvent) {
        self.events.emit(&event.with("manager_id", self.manager_id));
    }
}

impl Drop for SessionScope<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        self.emit(LifecycleEvent::error(
            "Database session dropped before commit or rollback; aborting",
        ));
        self.session.abort();
    }
}

impl fmt::Debug for SessionScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionScope")
            .field("manager_id", &self.manager_id)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
