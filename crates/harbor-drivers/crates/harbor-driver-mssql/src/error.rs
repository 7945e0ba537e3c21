//! MS SQL Server engine errors

use std::time::Duration;

use harbor_core::HarborError;

/// Server error numbers that describe a temporary condition: database not
/// yet available (4060) or service busy/failing over (40197 and up)
const TRANSIENT_SERVER_ERRORS: &[u32] = &[4060, 40197, 40501, 40613, 49918, 49919, 49920];

/// MS SQL Server engine errors
#[derive(Debug, thiserror::Error)]
pub enum MssqlEngineError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("Integrated authentication is only supported on Windows")]
    IntegratedAuthUnavailable,

    #[error("No credentials: trusted connection disabled and no SQL login configured")]
    MissingCredentials,

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Tiberius error: {0}")]
    Tiberius(#[from] tiberius::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MssqlEngineError {
    /// Whether retrying the operation later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            MssqlEngineError::ConnectionFailed(_)
            | MssqlEngineError::Timeout(_)
            | MssqlEngineError::Io(_) => true,
            MssqlEngineError::Tiberius(err) => match err {
                tiberius::error::Error::Io { .. } => true,
                // a redirect names another server; retrying this one cannot succeed
                tiberius::error::Error::Routing { .. } => false,
                tiberius::error::Error::Server(token) => {
                    TRANSIENT_SERVER_ERRORS.contains(&token.code())
                }
                _ => false,
            },
            MssqlEngineError::IntegratedAuthUnavailable
            | MssqlEngineError::MissingCredentials
            | MssqlEngineError::ConnectionClosed => false,
        }
    }
}

impl From<MssqlEngineError> for HarborError {
    fn from(err: MssqlEngineError) -> Self {
        match err {
            MssqlEngineError::Timeout(_) => HarborError::Timeout(err.to_string()),
            MssqlEngineError::Io(io) => HarborError::Io(io),
            MssqlEngineError::IntegratedAuthUnavailable | MssqlEngineError::MissingCredentials => {
                HarborError::NotSupported(err.to_string())
            }
            MssqlEngineError::ConnectionClosed => HarborError::Session(err.to_string()),
            other if other.is_transient() => HarborError::Connectivity(other.to_string()),
            other => HarborError::Driver(other.to_string()),
        }
    }
}
