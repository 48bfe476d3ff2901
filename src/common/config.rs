use std::path::Path;
use std::time::Duration;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use crate::common::error::{ArangoError, ErrorKind, Result};
use crate::connection::resolver::ResolverKind;

fn default_hosts() -> Vec<String> {
    vec!["http://127.0.0.1:8529".to_string()]
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_job_poll_interval_ms() -> u64 {
    100
}

fn default_database() -> String {
    "_system".to_string()
}

fn default_username() -> String {
    "root".to_string()
}

/// How [`ClientConfig::username`] and [`ClientConfig::password`] are sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// HTTP basic auth on every request
    #[default]
    Basic,
    /// Exchanged for a JWT, renewed when the server rejects it
    Jwt,
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,
    /// Defaults to `single` for one host and `roundrobin` otherwise
    #[serde(default)]
    pub host_resolver: Option<ResolverKind>,
    #[serde(default)]
    pub max_tries: Option<usize>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Sleep between result polls of async jobs
    #[serde(default = "default_job_poll_interval_ms")]
    pub job_poll_interval_ms: u64,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub auth_method: AuthMethod,
    /// Used as is instead of the credentials
    #[serde(default)]
    pub superuser_token: Option<String>,
    /// Ping the server when opening a database
    #[serde(default)]
    pub verify: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            hosts: default_hosts(),
            host_resolver: None,
            max_tries: None,
            request_timeout_secs: default_request_timeout_secs(),
            job_poll_interval_ms: default_job_poll_interval_ms(),
            database: default_database(),
            username: default_username(),
            password: String::new(),
            auth_method: AuthMethod::Basic,
            superuser_token: None,
            verify: false,
        }
    }
}

impl ClientConfig {
    /// Load from an optional TOML file overlaid with `ARANGO_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("ARANGO")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("hosts")
    }

    fn load_from(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let config: ClientConfig = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hosts.is_empty() {
            return Err(ArangoError::client(ErrorKind::ServerConnection, "at least one host is required"));
        }
        for host in &self.hosts {
            url::Url::parse(host)?;
        }
        if self.job_poll_interval_ms == 0 {
            return Err(ArangoError::client(
                ErrorKind::ServerConnection,
                "job_poll_interval_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn resolver_kind(&self) -> ResolverKind {
        self.host_resolver.unwrap_or(if self.hosts.len() > 1 {
            ResolverKind::RoundRobin
        } else {
            ResolverKind::Single
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn job_poll_interval(&self) -> Duration {
        Duration::from_millis(self.job_poll_interval_ms)
    }
}
