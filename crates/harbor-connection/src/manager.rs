//! Connection manager owning the lifecycle of one logical connection

use std::fmt;
use std::sync::Arc;

use harbor_core::{
    ConnectOptions, ConnectionDescriptor, ConnectionTarget, DriverDescriptor, DriverRegistry,
    Engine, EngineHandle, EventSink, HarborError, LifecycleConfig, LifecycleEvent, Result, Session,
    SessionFactory, SharedEventSink, SupportedDrivers, TracingSink,
};
use uuid::Uuid;

use crate::{BackoffPolicy, DriverResolver, SessionScope};


/// Lifecycle state of a [`ConnectionManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Uninitialized,
    Connecting,
    Connected,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Uninitialized => "uninitialized",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The engine handle and everything derived from it. Only exists while
/// connected, which keeps "factory present iff connected" structural.
struct LiveConnection {
    handle: Box<dyn EngineHandle>,
    factory: Arc<dyn SessionFactory>,
    driver: DriverDescriptor,
    descriptor: ConnectionDescriptor,
}

enum Phase {
    Uninitialized,
    Connecting,
    Connected(LiveConnection),
    Closed,
}

impl From<&Phase> for ConnectionState {
    fn from(phase: &Phase) -> Self {
        match phase {
            Phase::Uninitialized => ConnectionState::Uninitialized,
            Phase::Connecting => ConnectionState::Connecting,
            Phase::Connected(_) => ConnectionState::Connected,
            Phase::Closed => ConnectionState::Closed,
        }
    }
}

/// Manages one logical database connection.
///
/// Resolves a driver, connects with retry and exponential backoff, hands out
/// sessions while connected and disposes the engine handle on close.
///
/// # Example
///
/// ```ignore
/// let mut manager = ConnectionManager::new(target, registry, engine);
/// manager.initialize().await?;
///
/// manager
///     .with_session(async |session| {
///         session.execute("SELECT 1").await?;
///         Ok::<_, HarborError>(())
///     })
///     .await?;
///
/// manager.close().await;
/// ```
pub struct ConnectionManager {
    id: Uuid,
    target: ConnectionTarget,
    registry: Arc<dyn DriverRegistry>,
    engine: Arc<dyn Engine>,
    events: SharedEventSink,
    supported: SupportedDrivers,
    backoff: BackoffPolicy,
    max_attempts: u32,
    dialect: String,
    phase: Phase,
}

impl ConnectionManager {
    /// Create an uninitialized manager with default configuration
    pub fn new(
        target: ConnectionTarget,
        registry: Arc<dyn DriverRegistry>,
        engine: Arc<dyn Engine>,
    ) -> Self {
        let config = LifecycleConfig::default();
        Self {
            id: Uuid::new_v4(),
            target,
            registry,
            engine,
            events: Arc::new(TracingSink),
            supported: config.supported(),
            backoff: BackoffPolicy::from_config(&config.backoff),
            max_attempts: config.attempts(),
            dialect: config.dialect,
            phase: Phase::Uninitialized,
        }
    }

    /// Apply retry budget, backoff, driver list and dialect from `config`
    pub fn with_config(mut self, config: &LifecycleConfig) -> Self {
        self.supported = config.supported();
        self.backoff = BackoffPolicy::from_config(&config.backoff);
        self.max_attempts = config.attempts();
        self.dialect = config.dialect.clone();
        self
    }

    /// Replace the backoff policy
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Send lifecycle events to `events` instead of `tracing`
    pub fn with_event_sink(mut self, events: SharedEventSink) -> Self {
        self.events = events;
        self
    }

    /// Unique id of this manager, attached to its events
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from(&self.phase)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.phase, Phase::Connected(_))
    }

    /// Driver in use, while connected
    pub fn driver(&self) -> Option<&DriverDescriptor> {
        match &self.phase {
            Phase::Connected(live) => Some(&live.driver),
            _ => None,
        }
    }

    /// Descriptor the engine was opened with, while connected
    pub fn descriptor(&self) -> Option<&ConnectionDescriptor> {
        match &self.phase {
            Phase::Connected(live) => Some(&live.descriptor),
            _ => None,
        }
    }

    /// Establish the connection.
    ///
    /// Makes up to the configured number of attempts. Transient failures are
    /// retried after the backoff delay; anything else, including a missing
    /// driver, fails immediately. On failure the manager ends up `Closed`.
    #[tracing::instrument(skip(self), fields(manager_id = %self.id, host = %self.target.host(), database = %self.target.database()))]
    pub async fn initialize(&mut self) -> Result<()> {
        if !matches!(self.phase, Phase::Uninitialized) {
            return Err(HarborError::InvalidState {
                operation: "initialize",
                state: self.state().as_str(),
            });
        }

        self.phase = Phase::Connecting;

        match self.connect_with_retry().await {
            Ok(live) => {
                self.emit(
                    LifecycleEvent::info("Connection to database successful.")
                        .with("host", self.target.host())
                        .with("port", self.target.port())
                        .with("database", self.target.database())
                        .with("driver", &live.driver),
                );
                self.phase = Phase::Connected(live);
                Ok(())
            }
            Err(err) => {
                self.phase = Phase::Closed;
                Err(err)
            }
        }
    }

    async fn connect_with_retry(&self) -> Result<LiveConnection> {
        let max_attempts = self.max_attempts;
        let mut attempt = 0u32;

        loop {
            let err = match self.attempt_connection().await {
                Ok(live) => return Ok(live),
                Err(err) => err,
            };

            if !err.is_transient() {
                self.emit(
                    LifecycleEvent::error(format!("Failed to initialise database connection: {err}"))
                        .with("attempt", attempt + 1),
                );
                return Err(err);
            }

            let attempts = attempt + 1;
            if attempts >= max_attempts {
                self.emit(
                    LifecycleEvent::error(format!(
                        "Failed to connect to database after {max_attempts} attempts."
                    ))
                    .with("error", &err),
                );
                return Err(HarborError::ConnectionFailed {
                    attempts,
                    max_attempts,
                    cause: Box::new(err),
                });
            }

            let delay = self.backoff.delay(attempt);
            self.emit(
                LifecycleEvent::warning(format!(
                    "Connection attempt {attempts} failed. Retrying in {delay:?}"
                ))
                .with("attempt", attempts)
                .with("max_attempts", max_attempts)
                .with("delay_ms", delay.as_millis())
                .with("error", &err),
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// One attempt: resolve driver, open the engine, probe once.
    async fn attempt_connection(&self) -> Result<LiveConnection> {
        let driver = DriverResolver::new(&self.supported, self.registry.as_ref()).resolve()?;
        let descriptor = ConnectionDescriptor::new(&self.dialect, &self.target, driver.clone());
        let options = ConnectOptions::from_target(&self.target);

        tracing::debug!(engine = self.engine.name(), descriptor = %descriptor, "opening engine");
        let handle = self.engine.open(&descriptor, options).await?;

        // fail early: a handle that cannot answer is not connected
        if let Err(err) = handle.probe().await {
            if let Err(dispose_err) = handle.dispose().await {
                tracing::warn!(error = %dispose_err, "failed to dispose unresponsive handle");
            }
            return Err(err);
        }

        let factory = handle.new_session_factory();
        Ok(LiveConnection {
            handle,
            factory,
            driver,
            descriptor,
        })
    }

    /// Start a new session.
    ///
    /// Fails with [`HarborError::NotInitialized`] unless connected.
    pub async fn create_session(&self) -> Result<SessionScope<'_>> {
        let Phase::Connected(live) = &self.phase else {
            return Err(HarborError::NotInitialized);
        };

        let session = live.factory.create_session().await?;
        tracing::debug!(manager_id = %self.id, "session created");
        Ok(SessionScope::new(session, self.events.as_ref(), self.id))
    }

    /// Run `body` in a new session: commit on success, roll back on error,
    /// always close. See [`SessionScope::run`].
    pub async fn with_session<T, E, F>(&self, body: F) -> std::result::Result<T, E>
    where
        F: AsyncFnOnce(&mut dyn Session) -> std::result::Result<T, E>,
        E: From<HarborError> + fmt::Display,
    {
        let scope = self.create_session().await?;
        scope.run(body).await
    }

    /// Dispose the connection.
    ///
    /// Idempotent and infallible: a second call, or a call before
    /// `initialize`, does nothing. Dispose failures are reported as events.
    #[tracing::instrument(skip(self), fields(manager_id = %self.id))]
    pub async fn close(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Closed) {
            Phase::Connected(live) => {
                drop(live.factory);
                match live.handle.dispose().await {
                    Ok(()) => self.emit(
                        LifecycleEvent::info("Database connection closed.")
                            .with("host", self.target.host())
                            .with("database", self.target.database()),
                    ),
                    Err(err) => self.emit(LifecycleEvent::error(format!(
                        "Failed to dispose database connection: {err}"
                    ))),
                }
            }
            previous => {
                tracing::debug!(
                    state = %ConnectionState::from(&previous),
                    "close called without a live connection"
                );
            }
        }
    }

    fn emit(&self, event: LifecycleEvent) {
        self.events.emit(&event.with("manager_id", self.id));
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Phase::Connected(live) = &self.phase {
            tracing::warn!(
                manager_id = %self.id,
                descriptor = %live.descriptor,
                "connection manager dropped without close; handle released without dispose"
            );
        }
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("state", &self.state())
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}
