//! Scoped connection lifecycle
//!
//! [`Lifecycle`] bundles the collaborators a [`ConnectionManager`] needs and
//! runs a body against a freshly initialized manager, closing it afterwards
//! no matter how the body ends.

use std::fmt;
use std::sync::Arc;

use harbor_core::{
    ConnectionTarget, DriverRegistry, Engine, EventSink, HarborError, LifecycleConfig,
    LifecycleEvent, SharedEventSink, TracingSink,
};

use crate::ConnectionManager;


/// Entry point for scoped connection use.
///
/// ```ignore
/// let lifecycle = Lifecycle::new(registry, engine).with_config(config);
///
/// let rows = lifecycle
///     .with_connection(target, async |manager| {
///         manager
///             .with_session(async |session| session.execute("DELETE FROM staging").await)
///             .await
///     })
///     .await?;
/// ```
#[derive(Clone)]
pub struct Lifecycle {
    registry: Arc<dyn DriverRegistry>,
    engine: Arc<dyn Engine>,
    events: SharedEventSink,
    config: LifecycleConfig,
}

impl Lifecycle {
    pub fn new(registry: Arc<dyn DriverRegistry>, engine: Arc<dyn Engine>) -> Self {
        Self {
            registry,
            engine,
            events: Arc::new(TracingSink),
            config: LifecycleConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_event_sink(mut self, events: SharedEventSink) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Build an uninitialized manager for `target` sharing this lifecycle's
    /// collaborators and configuration
    pub fn manager(&self, target: ConnectionTarget) -> ConnectionManager {
        ConnectionManager::new(target, self.registry.clone(), self.engine.clone())
            .with_config(&self.config)
            .with_event_sink(self.events.clone())
    }

    /// Connect to `target`, run `body` with the connected manager and close
    /// the connection exactly once afterwards.
    ///
    /// When initialization fails `body` is not run and the initialization
    /// error is returned. Errors from `body` are reported as an event and
    /// returned unchanged after the connection is closed.
    pub async fn with_connection<T, E, F>(
        &self,
        target: ConnectionTarget,
        body: F,
    ) -> Result<T, E>
    where
        F: AsyncFnOnce(&ConnectionManager) -> Result<T, E>,
        E: From<HarborError> + fmt::Display,
    {
        let mut manager = self.manager(target);

        let outcome = match manager.initialize().await {
            Ok(()) => match body(&manager).await {
                Ok(value) => Ok(value),
                Err(err) => {
                    self.events.emit(
                        &LifecycleEvent::error(format!(
                            "Unexpected error occurred while using database connection: {err}"
                        ))
                        .with("manager_id", manager.id()),
                    );
                    Err(err)
                }
            },
            Err(err) => Err(E::from(err)),
        };

        manager.close().await;
        outcome
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("engine", &self.engine.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
