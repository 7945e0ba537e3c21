//! MS SQL Server engine for Harbor
//!
//! This crate implements the `Engine` collaborator from `harbor-core` with a
//! native TDS client (tiberius), so the connection lifecycle can reach SQL
//! Server without an ODBC driver manager.

mod engine;
mod error;
mod session;

#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod session_tests;

pub use engine::{MssqlEngine, MssqlHandle};
pub use error::MssqlEngineError;
pub use session::{MssqlSession, MssqlSessionFactory};
