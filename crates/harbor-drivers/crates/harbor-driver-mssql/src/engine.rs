//! MS SQL Server engine using tiberius

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use harbor_core::{
    ConnectOptions, ConnectionDescriptor, Engine, EngineHandle, Result, SessionFactory,
};
use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::error::MssqlEngineError;
use crate::session::MssqlSessionFactory;

pub(crate) type MssqlClient = Client<Compat<TcpStream>>;

/// Client shared by a handle and every session drawn from it. `None` once
/// the handle has been disposed.
pub(crate) type SharedClient = Arc<Mutex<Option<MssqlClient>>>;

/// SQL Server login used instead of integrated authentication
#[derive(Clone)]
struct SqlCredentials {
    user: String,
    password: String,
}

impl fmt::Debug for SqlCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlCredentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Native TDS engine for MS SQL Server.
///
/// Connects directly over TCP; the resolved ODBC driver name only selects
/// which descriptor is built and is otherwise informational. Authentication
/// is integrated (Windows only) unless SQL credentials are configured.
#[derive(Debug, Clone)]
pub struct MssqlEngine {
    credentials: Option<SqlCredentials>,
    trust_cert: bool,
    encryption: EncryptionLevel,
}

impl MssqlEngine {
    pub fn new() -> Self {
        tracing::debug!("MS SQL Server engine initialized");
        Self {
            credentials: None,
            trust_cert: false,
            encryption: EncryptionLevel::Required,
        }
    }

    /// Authenticate with a SQL Server login instead of integrated auth
    pub fn with_sql_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(SqlCredentials {
            user: user.into(),
            password: password.into(),
        });
        self
    }

    /// Trust the server certificate without validation (for development)
    pub fn with_trust_cert(mut self, trust_cert: bool) -> Self {
        self.trust_cert = trust_cert;
        self
    }

    pub fn with_encryption(mut self, encryption: EncryptionLevel) -> Self {
        self.encryption = encryption;
        self
    }

    /// Translate a descriptor into tiberius configuration
    pub(crate) fn build_config(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> std::result::Result<Config, MssqlEngineError> {
        let mut config = Config::new();
        config.host(descriptor.host());
        config.port(descriptor.port());
        config.database(descriptor.database());
        config.application_name("harbor");
        config.encryption(self.encryption);

        if self.trust_cert {
            config.trust_cert();
        }

        match (&self.credentials, descriptor.trusted_connection()) {
            (Some(credentials), _) => {
                config.authentication(AuthMethod::sql_server(
                    &credentials.user,
                    &credentials.password,
                ));
            }
            (None, true) => {
                #[cfg(windows)]
                {
                    config.authentication(AuthMethod::Integrated);
                }
                #[cfg(not(windows))]
                {
                    return Err(MssqlEngineError::IntegratedAuthUnavailable);
                }
            }
            (None, false) => return Err(MssqlEngineError::MissingCredentials),
        }

        Ok(config)
    }

    async fn connect(config: Config) -> std::result::Result<MssqlClient, MssqlEngineError> {
        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| MssqlEngineError::ConnectionFailed(e.to_string()))?;
        tcp.set_nodelay(true)?;

        let client = Client::connect(config, tcp.compat_write()).await?;
        Ok(client)
    }
}

impl Default for MssqlEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for MssqlEngine {
    fn name(&self) -> &str {
        "mssql"
    }

    #[tracing::instrument(skip(self, descriptor), fields(host = descriptor.host(), port = descriptor.port(), database = descriptor.database()))]
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
        options: ConnectOptions,
    ) -> Result<Box<dyn EngineHandle>> {
        let config = self.build_config(descriptor)?;

        tracing::debug!(timeout = ?options.timeout, "connecting to MS SQL Server");
        let client = tokio::time::timeout(options.timeout, Self::connect(config))
            .await
            .map_err(|_| MssqlEngineError::Timeout(options.timeout))??;

        tracing::debug!("successfully connected to MS SQL Server");
        Ok(Box::new(MssqlHandle {
            client: Arc::new(Mutex::new(Some(client))),
        }))
    }
}

/// Live MS SQL Server connection
pub struct MssqlHandle {
    client: SharedClient,
}

#[async_trait]
impl EngineHandle for MssqlHandle {
    async fn probe(&self) -> Result<()> {
        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or(MssqlEngineError::ConnectionClosed)?;

        client
            .simple_query("SELECT 1")
            .await
            .map_err(MssqlEngineError::from)?
            .into_results()
            .await
            .map_err(MssqlEngineError::from)?;

        tracing::debug!("probe succeeded");
        Ok(())
    }

    fn new_session_factory(&self) -> Arc<dyn SessionFactory> {
        Arc::new(MssqlSessionFactory::new(self.client.clone()))
    }

    async fn dispose(self: Box<Self>) -> Result<()> {
        let client = self.client.lock().await.take();
        if let Some(client) = client {
            client.close().await.map_err(MssqlEngineError::from)?;
            tracing::debug!("MS SQL Server connection closed");
        }
        Ok(())
    }
}
