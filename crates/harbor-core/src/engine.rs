//! Engine trait definition
//!
//! An engine is the client library that actually talks to the server. The
//! connection manager only needs it to open a handle, probe it once, derive
//! a session factory from it and dispose it again.

use crate::{ConnectOptions, ConnectionDescriptor, Result, SessionFactory};
use async_trait::async_trait;
use std::sync::Arc;

/// Client library capable of opening connections to a database server
#[async_trait]
pub trait Engine: Send + Sync {
    /// Engine name used in logs (e.g. "mssql")
    fn name(&self) -> &str;

    /// Open a live handle to the server described by `descriptor`
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
        options: ConnectOptions,
    ) -> Result<Box<dyn EngineHandle>>;
}

/// A live connection to the database server
#[async_trait]
pub trait EngineHandle: Send + Sync {
    /// Run one trivial round-trip to prove the connection is usable
    async fn probe(&self) -> Result<()>;

    /// Create the factory sessions are drawn from
    fn new_session_factory(&self) -> Arc<dyn SessionFactory>;

    /// Release every resource held by the handle.
    ///
    /// Consumes the handle, so it can be disposed at most once.
    async fn dispose(self: Box<Self>) -> Result<()>;
}
