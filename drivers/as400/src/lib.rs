//! # SQLGate AS400 driver
//!
//! Connects to DB2 for i through an ODBC driver manager and the IBM i Access ODBC driver.
//! ODBC handles are owned by a dedicated thread per connection; the async [`Connection`],
//! [`Statement`] and [`Cursor`] implementations exchange requests with that thread.
//!
//! [`Connection`]: sqlgate_driver::Connection
//! [`Statement`]: sqlgate_driver::Statement
//! [`Cursor`]: sqlgate_driver::Cursor

#![forbid(unsafe_code)]
#![forbid(clippy::allow_attributes)]

mod connection;
mod connection_string;
mod driver;
mod error;
mod metadata;

pub use driver::{Driver, ODBC_DRIVER};

use sqlgate_driver::{DriverManager, Result};
use std::sync::Arc;

/// Create a driver manager with the `as400` driver registered.
///
/// # Errors
/// * If the driver cannot be registered
pub fn driver_manager() -> Result<DriverManager> {
    let driver_manager = DriverManager::new();
    driver_manager.add(Arc::new(Driver::default()))?;
    Ok(driver_manager)
}
