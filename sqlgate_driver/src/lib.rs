//! # SQLGate Driver
//!
//! Driver abstraction used by the gateway: a driver opens a [`Connection`] for a connection
//! target, the connection creates a [`Statement`] and the statement yields a [`Cursor`] over
//! the result rows. Each resource borrows its parent and is released in reverse order.

#![forbid(unsafe_code)]
#![forbid(clippy::allow_attributes)]

mod connection;
mod driver;
mod driver_manager;
mod error;
mod metadata;
mod value;

pub use connection::{
    Connection, Cursor, MemoryCursor, MockConnection, MockCursor, MockStatement, Row, Statement,
};
pub use driver::{Credentials, Driver, MockDriver};
pub use driver_manager::DriverManager;
pub use error::{Error, Result, SqlError};
pub use metadata::{Column, SqlType};
pub use value::Value;
