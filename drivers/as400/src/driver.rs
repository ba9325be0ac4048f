use crate::connection::Connection;
use crate::connection_string::ConnectionString;
use async_trait::async_trait;
use sqlgate_driver::{Credentials, Result};
use tracing::debug;

/// Name of the ODBC driver registered by IBM i Access Client Solutions
pub const ODBC_DRIVER: &str = "IBM i Access ODBC Driver";

#[derive(Clone, Debug)]
pub struct Driver {
    odbc_driver: String,
}

impl Driver {
    /// Create a driver that connects through the named ODBC driver.
    pub fn new<S: Into<String>>(odbc_driver: S) -> Self {
        Self {
            odbc_driver: odbc_driver.into(),
        }
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(ODBC_DRIVER)
    }
}

#[async_trait]
impl sqlgate_driver::Driver for Driver {
    fn identifier(&self) -> &'static str {
        "as400"
    }

    async fn connect(
        &self,
        target: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn sqlgate_driver::Connection>> {
        let connection_string = ConnectionString::new(&self.odbc_driver, target, credentials)?;
        debug!("Connecting with ODBC driver [{}]", self.odbc_driver);
        let connection = Connection::open(connection_string).await?;
        Ok(Box::new(connection))
    }
}
