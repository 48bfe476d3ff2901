use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use crate::api::database::Database;
use crate::api::executor::DefaultExecutor;
use crate::common::config::{AuthMethod, ClientConfig};
use crate::common::error::{ArangoError, ErrorKind, Result};
use crate::connection::{Auth, Connection, DefaultHttpClient, HostResolver, HttpClient};

/// Entry point: holds the host list and the transport, and opens databases
pub struct ArangoClient {
    config: ClientConfig,
    http: Arc<dyn HttpClient>,
}

impl ArangoClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = Arc::new(DefaultHttpClient::with_timeout(config.request_timeout())?);
        info!(
            "ArangoDB client for {} host(s), resolver {:?}",
            config.hosts.len(),
            config.resolver_kind()
        );
        Ok(ArangoClient { config, http })
    }

    /// Client for a comma separated host list with default settings
    pub fn from_hosts(hosts: &str) -> Result<Self> {
        let hosts = hosts
            .split(',')
            .map(|h| h.trim().trim_end_matches('/').to_string())
            .filter(|h| !h.is_empty())
            .collect();
        Self::new(ClientConfig { hosts, ..ClientConfig::default() })
    }

    /// Replace the transport
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = http;
        self
    }

    pub fn hosts(&self) -> &[String] {
        &self.config.hosts
    }

    pub fn request_timeout(&self) -> Duration {
        self.config.request_timeout()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open a database. With `verify` set the server is contacted first and
    /// a refused connection or bad credentials fail here. [`Auth::Jwt`]
    /// credentials are exchanged for a token right away.
    pub async fn db(&self, name: &str, auth: Option<Auth>, verify: bool) -> Result<Database<DefaultExecutor>> {
        let resolver = HostResolver::from_kind(
            self.config.resolver_kind(),
            self.config.hosts.len(),
            self.config.max_tries,
        )?;
        let uses_jwt = matches!(auth, Some(Auth::Jwt { .. }));
        let conn = Connection::new(&self.config.hosts, resolver, Arc::clone(&self.http), name, auth);
        let to_client_error = |e: ArangoError| match e {
            ArangoError::Connection(message) => ArangoError::client(ErrorKind::ServerConnection, message),
            other => other,
        };

        if uses_jwt {
            conn.refresh_token().await.map_err(to_client_error)?;
        }
        if verify {
            conn.ping().await.map_err(to_client_error)?;
        }

        Ok(Database::new(DefaultExecutor::new(conn), self.config.job_poll_interval()))
    }

    /// Open the configured database with the configured credentials
    pub async fn default_db(&self) -> Result<Database<DefaultExecutor>> {
        let username = self.config.username.clone();
        let password = self.config.password.clone();
        let auth = match (&self.config.superuser_token, self.config.auth_method) {
            (Some(token), _) => Auth::Bearer(token.clone()),
            (None, AuthMethod::Basic) => Auth::Basic { username, password },
            (None, AuthMethod::Jwt) => Auth::Jwt { username, password },
        };
        self.db(&self.config.database, Some(auth), self.config.verify).await
    }
}

impl fmt::Debug for ArangoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<ArangoClient {}>", self.config.hosts.join(","))
    }
}
