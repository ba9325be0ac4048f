use crate::error::{Error, Result};
use crate::{AuthGate, ExecutorConfig};
use config::{Config, ConfigError, FileFormat};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;
use tracing::level_filters::LevelFilter;

pub(crate) static DEFAULT_CONFIG: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/sqlgate.toml"));

const ENV_PREFIX: &str = "SQLGATE";

/// A builder for creating a [Configuration] instance.
///
/// Values are layered: built-in defaults, then the configuration file (if any), then
/// environment variables prefixed with `SQLGATE_`, then explicit `with_*` overrides.
#[derive(Clone, Debug)]
pub struct ConfigurationBuilder {
    config_file: Option<PathBuf>,
    env_prefix: String,
    connection_timeout: Option<Duration>,
    query_timeout: Option<Duration>,
    auth_secret: Option<String>,
    log_level: Option<LevelFilter>,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self {
            config_file: None,
            env_prefix: ENV_PREFIX.to_string(),
            connection_timeout: None,
            query_timeout: None,
            auth_secret: None,
            log_level: None,
        }
    }
}

impl ConfigurationBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from a TOML file; the file must exist.
    #[must_use]
    pub fn with_config_file<P: Into<PathBuf>>(mut self, config_file: P) -> Self {
        self.config_file = Some(config_file.into());
        self
    }

    /// Set the prefix of the environment variables to read.
    #[must_use]
    pub fn with_env_prefix<S: Into<String>>(mut self, env_prefix: S) -> Self {
        self.env_prefix = env_prefix.into();
        self
    }

    #[must_use]
    pub fn with_connection_timeout(mut self, connection_timeout: Duration) -> Self {
        self.connection_timeout = Some(connection_timeout);
        self
    }

    #[must_use]
    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = Some(query_timeout);
        self
    }

    #[must_use]
    pub fn with_auth_secret<S: Into<String>>(mut self, auth_secret: S) -> Self {
        self.auth_secret = Some(auth_secret.into());
        self
    }

    #[must_use]
    pub fn with_log_level(mut self, log_level: LevelFilter) -> Self {
        self.log_level = Some(log_level);
        self
    }

    /// Build a [Configuration] instance.
    ///
    /// # Errors
    /// * If the configuration file cannot be read
    /// * If a configuration value is not valid
    pub fn build(self) -> Result<Configuration> {
        let mut builder =
            Config::builder().add_source(config::File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        if let Some(config_file) = &self.config_file {
            debug!("Configuration file: {}", config_file.display());
            builder = builder.add_source(
                config::File::from(config_file.as_path()).format(FileFormat::Toml),
            );
        }
        debug!("Configuration environment prefix: {}", self.env_prefix);
        let config = builder
            .add_source(config::Environment::with_prefix(&self.env_prefix).separator("_"))
            .build()?;

        let mut configuration = Configuration::try_from(&config)?;
        if let Some(connection_timeout) = self.connection_timeout {
            configuration.connection_timeout = connection_timeout;
        }
        if let Some(query_timeout) = self.query_timeout {
            configuration.query_timeout = query_timeout;
        }
        if let Some(auth_secret) = self.auth_secret {
            configuration.auth_secret = auth_secret;
        }
        if let Some(log_level) = self.log_level {
            configuration.log_level = log_level;
        }
        Ok(configuration)
    }
}

/// The configuration for the gateway.
#[derive(Clone)]
pub struct Configuration {
    pub connection_timeout: Duration,
    pub query_timeout: Duration,
    pub auth_secret: String,
    pub log_level: LevelFilter,
}

impl Configuration {
    /// Timeouts for the query executor
    #[must_use]
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig::new(self.connection_timeout, self.query_timeout)
    }

    /// Create the gate verifying bearer tokens with the configured secret.
    ///
    /// # Errors
    /// * If no secret is configured
    pub fn auth_gate(&self) -> Result<AuthGate> {
        AuthGate::new(&self.auth_secret)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_millis(30_000),
            query_timeout: Duration::ZERO,
            auth_secret: String::new(),
            log_level: LevelFilter::INFO,
        }
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("connection_timeout", &self.connection_timeout)
            .field("query_timeout", &self.query_timeout)
            .field("auth_secret", &"****")
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl TryFrom<&Config> for Configuration {
    type Error = Error;

    fn try_from(config: &Config) -> Result<Self> {
        let mut configuration = Configuration::default();

        if let Some(connection_timeout) = get::<u64>(config, "connection.timeout")? {
            configuration.connection_timeout = Duration::from_millis(connection_timeout);
        }
        if let Some(query_timeout) = get::<u64>(config, "query.timeout")? {
            configuration.query_timeout = Duration::from_secs(query_timeout);
        }
        if let Some(auth_secret) = get::<String>(config, "auth.secret")? {
            configuration.auth_secret = auth_secret;
        }
        if let Some(log_level) = get::<String>(config, "log.level")? {
            configuration.log_level =
                LevelFilter::from_str(log_level.as_str()).map_err(|error| {
                    Error::InvalidConfiguration {
                        key: "log.level".to_string(),
                        message: error.to_string(),
                    }
                })?;
        }

        Ok(configuration)
    }
}

/// Value of a key, `None` when the key is not set.
fn get<T: DeserializeOwned>(config: &Config, key: &str) -> Result<Option<T>> {
    match config.get::<T>(key) {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(error) => Err(Error::InvalidConfiguration {
            key: key.to_string(),
            message: error.to_string(),
        }),
    }
}
