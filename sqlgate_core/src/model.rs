use crate::error::{Error, Result};
use serde::Deserialize;
use sqlgate_driver::Credentials;
use std::fmt::{self, Debug};

/// Description of a remote database endpoint together with the credentials used to reach it.
#[derive(Clone, Default, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionSpec {
    pub host: String,
    pub port: Option<i32>,
    pub database: Option<String>,
    pub username: String,
    pub password: String,
    pub secure: bool,
    pub library_list: Option<String>,
    pub default_schema: Option<String>,
}

impl ConnectionSpec {
    /// Credentials presented to the database for this request only.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.as_str(), self.password.as_str())
    }

    /// Validate the endpoint description.
    ///
    /// # Errors
    /// * If the host is blank
    /// * If the port is negative; zero selects the default port, as when it is absent
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Validation("Host cannot be empty".to_string()));
        }
        if matches!(self.port, Some(port) if port < 0) {
            return Err(Error::Validation(
                "Port must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

impl Debug for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSpec")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"****")
            .field("secure", &self.secure)
            .field("library_list", &self.library_list)
            .field("default_schema", &self.default_schema)
            .finish()
    }
}

/// A single SQL statement to run against the endpoint described by the request itself.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct QueryRequest {
    #[serde(flatten)]
    pub connection: ConnectionSpec,
    pub sql: String,
}

impl QueryRequest {
    pub fn new<S: Into<String>>(connection: ConnectionSpec, sql: S) -> Self {
        Self {
            connection,
            sql: sql.into(),
        }
    }

    /// Validate the request before any connection attempt is made.
    ///
    /// # Errors
    /// * If the SQL is blank
    /// * If the connection spec is invalid
    pub fn validate(&self) -> Result<()> {
        if self.sql.trim().is_empty() {
            return Err(Error::Validation("SQL query cannot be empty".to_string()));
        }
        self.connection.validate()
    }
}
