//! Mock collaborators shared by the unit tests of this crate

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use harbor_core::{
    ConnectOptions, ConnectionDescriptor, DriverRegistry, Engine, EngineHandle, HarborError,
    Result, Session, SessionFactory, StatementOutcome,
};
use parking_lot::Mutex;

/// Initialize logging for tests if not already initialized
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("harbor_connection=debug")),
            )
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Ordered record of every collaborator call
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    /// Calls belonging to sessions, in order
    pub fn session_calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|c| {
                matches!(c.as_str(), "commit" | "rollback" | "close" | "abort")
                    || c.starts_with("execute:")
            })
            .cloned()
            .collect()
    }
}

/// Driver registry returning a fixed list
pub struct StaticDrivers {
    drivers: Vec<String>,
    failure: Option<String>,
    lookups: AtomicUsize,
}

impl StaticDrivers {
    pub fn new(drivers: &[&str]) -> Self {
        Self {
            drivers: drivers.iter().map(|d| d.to_string()).collect(),
            failure: None,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            drivers: Vec::new(),
            failure: Some(message.to_string()),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl DriverRegistry for StaticDrivers {
    fn list_available_drivers(&self) -> Result<Vec<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(HarborError::Driver(message.clone())),
            None => Ok(self.drivers.clone()),
        }
    }
}

/// What a single `Engine::open` call does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Open and probe succeed
    Connect,
    /// Open fails with a transient connectivity error
    Refuse,
    /// Open succeeds, probe fails transiently
    FailProbe,
    /// Open fails with a non-transient error
    RejectFatally,
}

/// Which session operations fail
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFaults {
    pub commit: bool,
    pub rollback: bool,
    pub close: bool,
}

/// Scripted engine. Outcomes are consumed in order; once the script is
/// exhausted every open connects.
pub struct MockEngine {
    script: Mutex<VecDeque<OpenOutcome>>,
    faults: SessionFaults,
    dispose_fails: bool,
    log: Arc<CallLog>,
    opened: Mutex<Vec<(String, ConnectOptions)>>,
}

impl MockEngine {
    pub fn new(script: &[OpenOutcome]) -> Self {
        Self {
            script: Mutex::new(script.iter().copied().collect()),
            faults: SessionFaults::default(),
            dispose_fails: false,
            log: Arc::new(CallLog::default()),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn connecting() -> Self {
        Self::new(&[])
    }

    pub fn with_session_faults(mut self, faults: SessionFaults) -> Self {
        self.faults = faults;
        self
    }

    /// Every handle fails to dispose
    pub fn with_failing_dispose(mut self) -> Self {
        self.dispose_fails = true;
        self
    }

    pub fn log(&self) -> Arc<CallLog> {
        self.log.clone()
    }

    /// Descriptors and options passed to `open`, in order
    pub fn opened(&self) -> Vec<(String, ConnectOptions)> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl Engine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
        options: ConnectOptions,
    ) -> Result<Box<dyn EngineHandle>> {
        self.log.record("open");
        self.opened.lock().push((descriptor.to_string(), options));

        let outcome = self
            .script
            .lock()
            .pop_front()
            .unwrap_or(OpenOutcome::Connect);

        match outcome {
            OpenOutcome::Refuse => Err(HarborError::Connectivity("connection refused".into())),
            OpenOutcome::RejectFatally => {
                Err(HarborError::NotSupported("integrated authentication".into()))
            }
            OpenOutcome::Connect | OpenOutcome::FailProbe => Ok(Box::new(MockHandle {
                probe_fails: outcome == OpenOutcome::FailProbe,
                dispose_fails: self.dispose_fails,
                faults: self.faults,
                log: self.log.clone(),
            })),
        }
    }
}

struct MockHandle {
    probe_fails: bool,
    dispose_fails: bool,
    faults: SessionFaults,
    log: Arc<CallLog>,
}

#[async_trait]
impl EngineHandle for MockHandle {
    async fn probe(&self) -> Result<()> {
        self.log.record("probe");
        if self.probe_fails {
            Err(HarborError::Timeout("probe timed out".into()))
        } else {
            Ok(())
        }
    }

    fn new_session_factory(&self) -> Arc<dyn SessionFactory> {
        Arc::new(MockSessionFactory {
            faults: self.faults,
            log: self.log.clone(),
        })
    }

    async fn dispose(self: Box<Self>) -> Result<()> {
        self.log.record("dispose");
        if self.dispose_fails {
            Err(HarborError::Driver("dispose failed".into()))
        } else {
            Ok(())
        }
    }
}

struct MockSessionFactory {
    faults: SessionFaults,
    log: Arc<CallLog>,
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn create_session(&self) -> Result<Box<dyn Session>> {
        self.log.record("create_session");
        Ok(Box::new(MockSession {
            faults: self.faults,
            log: self.log.clone(),
        }))
    }
}

struct MockSession {
    faults: SessionFaults,
    log: Arc<CallLog>,
}

impl MockSession {
    fn finish(&self, call: &str, fails: bool) -> Result<()> {
        self.log.record(call);
        if fails {
            Err(HarborError::Session(format!("{call} failed")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Session for MockSession {
    async fn execute(&mut self, statement: &str) -> Result<StatementOutcome> {
        self.log.record(format!("execute:{statement}"));
        Ok(StatementOutcome::new(1))
    }

    async fn commit(&mut self) -> Result<()> {
        self.finish("commit", self.faults.commit)
    }

    async fn rollback(&mut self) -> Result<()> {
        self.finish("rollback", self.faults.rollback)
    }

    async fn close(&mut self) -> Result<()> {
        self.finish("close", self.faults.close)
    }

    fn abort(&mut self) {
        self.log.record("abort");
    }
}
