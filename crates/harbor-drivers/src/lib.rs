//! Harbor Drivers - Host driver discovery and concrete engines
//!
//! This crate provides implementations of the collaborator traits defined
//! in `harbor-core`: driver registries that report which client drivers a
//! host has installed, and (behind features) the engines that connect.

#[cfg(feature = "mssql")]
pub use harbor_driver_mssql as mssql;

mod registry;

pub use registry::{DEFAULT_ODBCINST_PATH, OdbcInstRegistry, StaticRegistry};

/// Re-export commonly used types from harbor-core
pub use harbor_core::{DriverRegistry, HarborError, Result};
