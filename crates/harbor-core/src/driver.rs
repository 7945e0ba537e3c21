//! Client driver identifiers and the host driver registry contract

use crate::Result;
use std::fmt;

/// Drivers known to work with SQL Server, in order of preference
pub const DEFAULT_SUPPORTED_DRIVERS: &[&str] = &[
    "ODBC Driver 17 for SQL Server",
    "ODBC Driver 13 for SQL Server",
    "SQL Server Native Client 11.0",
];

/// Opaque name of a client driver variant (e.g. "ODBC Driver 17 for SQL Server")
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DriverDescriptor(String);

impl DriverDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DriverDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered set of driver names known to be compatible.
///
/// The order is a priority list: when several supported drivers are
/// installed, the earliest entry wins. Duplicates are dropped, keeping
/// the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedDrivers {
    names: Vec<String>,
}

impl SupportedDrivers {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into().trim().to_string();
            if !name.is_empty() && !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self { names: unique }
    }

    /// Driver names in priority order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for SupportedDrivers {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPORTED_DRIVERS.iter().copied())
    }
}

/// Read-only view of the client drivers installed on this host
pub trait DriverRegistry: Send + Sync {
    /// List the names of all drivers the host can load
    fn list_available_drivers(&self) -> Result<Vec<String>>;
}
