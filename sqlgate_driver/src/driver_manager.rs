use crate::Error::{DriverNotFound, InvalidUrl, IoError};
use crate::error::Result;
use crate::{Connection, Credentials, Driver};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use tracing::instrument;

type DriverMap = BTreeMap<&'static str, Arc<dyn Driver>>;

/// Manages available drivers, keyed by the scheme of the connection targets they handle
#[derive(Clone, Debug, Default)]
pub struct DriverManager {
    drivers: Arc<RwLock<DriverMap>>,
}

impl DriverManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new driver to the list of available drivers
    ///
    /// # Errors
    /// * If a lock for drivers cannot be acquired
    pub fn add(&self, driver: Arc<dyn Driver>) -> Result<()> {
        let identifier = driver.identifier();
        let mut drivers = self
            .drivers
            .write()
            .map_err(|error| IoError(error.to_string()))?;
        let _ = drivers.insert(identifier, driver);
        Ok(())
    }

    /// Get a driver by identifier
    ///
    /// # Errors
    /// * If a lock for drivers cannot be acquired
    pub fn get<S: AsRef<str>>(&self, identifier: S) -> Result<Option<Arc<dyn Driver>>> {
        let identifier = identifier.as_ref();
        let drivers = self
            .drivers
            .read()
            .map_err(|error| IoError(error.to_string()))?;
        Ok(drivers.get(identifier).cloned())
    }

    /// Get all drivers
    ///
    /// # Errors
    /// * If a lock for drivers cannot be acquired
    pub fn drivers(&self) -> Result<Vec<Arc<dyn Driver>>> {
        let drivers = self
            .drivers
            .read()
            .map_err(|error| IoError(error.to_string()))?;
        Ok(drivers.values().cloned().collect())
    }

    /// Open a new connection to the target using the driver registered for its scheme
    ///
    /// # Errors
    /// * If the target has no scheme
    /// * If no driver is registered for the scheme
    /// * If the driver fails to connect
    #[instrument(name = "connect", level = "info", skip(self, credentials))]
    pub async fn connect(
        &self,
        target: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn Connection>> {
        let Some((scheme, _)) = target.split_once("://") else {
            return Err(InvalidUrl(format!("missing scheme: {target}")));
        };

        match self.get(scheme)? {
            Some(driver) => driver.connect(target, credentials).await,
            None => Err(DriverNotFound(scheme.to_string())),
        }
    }
}
