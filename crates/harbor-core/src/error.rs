//! Error types for Harbor

use thiserror::Error;

/// Core error type for connection lifecycle operations
#[derive(Error, Debug)]
pub enum HarborError {
    /// None of the supported drivers is installed on this host
    #[error("Driver resolution failed: no supported ODBC driver found (supported: {})", .supported.join(", "))]
    NoDriverFound { supported: Vec<String> },

    /// Every connection attempt failed with a transient error
    #[error("Connection attempt {attempts} of {max_attempts} failed, giving up: {cause}")]
    ConnectionFailed {
        attempts: u32,
        max_attempts: u32,
        #[source]
        cause: Box<HarborError>,
    },

    /// A session was requested before the connection was established
    #[error("Session initialization failed: database connection not initialised")]
    NotInitialized,

    /// A lifecycle operation was called in a state that does not allow it
    #[error("Cannot {operation} while connection is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Connection error: {0}")]
    Connectivity(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl HarborError {
    /// Whether the error may resolve by itself on a later attempt.
    ///
    /// Only transient errors are retried by the connection manager; anything
    /// else ends initialization immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HarborError::Connectivity(_) | HarborError::Timeout(_) | HarborError::Io(_)
        )
    }
}

/// Result type alias for Harbor operations
pub type Result<T> = std::result::Result<T, HarborError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(HarborError::Connectivity("refused".into()).is_transient());
        assert!(HarborError::Timeout("30s".into()).is_transient());
        assert!(
            HarborError::Io(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"))
                .is_transient()
        );

        assert!(!HarborError::NoDriverFound { supported: vec![] }.is_transient());
        assert!(!HarborError::NotInitialized.is_transient());
        assert!(!HarborError::Driver("bad".into()).is_transient());
        assert!(!HarborError::NotSupported("auth".into()).is_transient());
    }

    #[test]
    fn test_messages_name_the_failed_phase() {
        let err = HarborError::NoDriverFound {
            supported: vec!["ODBC Driver 17 for SQL Server".into()],
        };
        assert_eq!(
            err.to_string(),
            "Driver resolution failed: no supported ODBC driver found (supported: ODBC Driver 17 for SQL Server)"
        );

        let err = HarborError::ConnectionFailed {
            attempts: 3,
            max_attempts: 3,
            cause: Box::new(HarborError::Connectivity("login timeout expired".into())),
        };
        assert_eq!(
            err.to_string(),
            "Connection attempt 3 of 3 failed, giving up: Connection error: login timeout expired"
        );

        assert!(HarborError::NotInitialized
            .to_string()
            .starts_with("Session initialization failed"));
    }

    #[test]
    fn test_connection_failed_exposes_source() {
        use std::error::Error as _;

        let err = HarborError::ConnectionFailed {
            attempts: 1,
            max_attempts: 1,
            cause: Box::new(HarborError::Timeout("5s".into())),
        };
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Timeout: 5s"));
    }
}
