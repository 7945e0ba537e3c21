//! Connection descriptor handed to the engine

use crate::{ConnectionTarget, DriverDescriptor};
use std::fmt;
use std::time::Duration;

/// Dialect prefix used when none is configured
pub const DEFAULT_DIALECT: &str = "mssql+pyodbc";

/// Everything an engine needs to locate the server, rendered as
/// `<dialect>://<host>:<port>/<database>?driver=<driver>&trusted_connection=yes`.
///
/// The connect timeout is deliberately not part of the descriptor; it
/// travels separately in [`ConnectOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    dialect: String,
    host: String,
    port: u16,
    database: String,
    driver: DriverDescriptor,
    trusted_connection: bool,
}

impl ConnectionDescriptor {
    /// Build a descriptor for `target` using the resolved `driver`
    pub fn new(dialect: &str, target: &ConnectionTarget, driver: DriverDescriptor) -> Self {
        Self {
            dialect: dialect.to_string(),
            host: target.host().to_string(),
            port: target.port(),
            database: target.database().to_string(),
            driver,
            trusted_connection: true,
        }
    }

    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn driver(&self) -> &DriverDescriptor {
        &self.driver
    }

    /// Whether the connection authenticates with the caller's OS identity
    pub fn trusted_connection(&self) -> bool {
        self.trusted_connection
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}:{}/{}?driver={}",
            self.dialect, self.host, self.port, self.database, self.driver
        )?;
        if self.trusted_connection {
            f.write_str("&trusted_connection=yes")?;
        }
        Ok(())
    }
}

/// Connect-time options that are not part of the descriptor string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    pub timeout: Duration,
}

impl ConnectOptions {
    pub fn from_target(target: &ConnectionTarget) -> Self {
        Self {
            timeout: target.timeout(),
        }
    }
}
