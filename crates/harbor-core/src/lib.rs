//! Harbor Core - Core abstractions for the connection lifecycle
//!
//! This crate provides the types and traits every other Harbor crate
//! depends on. It defines:
//!
//! - `ConnectionTarget` - What to connect to
//! - `DriverRegistry` / `SupportedDrivers` - Host driver discovery inputs
//! - `Engine`, `EngineHandle` - The client library that opens connections
//! - `SessionFactory`, `Session` - Transactional units of work
//! - `EventSink` - Structured lifecycle events
//! - `HarborError` - The error taxonomy

mod config;
mod descriptor;
mod driver;
mod engine;
mod error;
mod event;
mod session;
mod target;

pub use config::*;
pub use descriptor::*;
pub use driver::*;
pub use engine::*;
pub use error::*;
pub use event::*;
pub use session::*;
pub use target::*;
