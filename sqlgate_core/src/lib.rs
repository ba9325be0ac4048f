//! # SQLGate Core
//!
//! Request-scoped execution of a single SQL statement against an endpoint described by the
//! request itself. A [`QueryService`] authenticates the request with an [`AuthGate`] and hands
//! it to the [`QueryExecutor`], which opens a dedicated connection, materializes at most
//! [`MAX_ROWS`] rows and reports every failure as a [`QueryResult`].

#![forbid(unsafe_code)]
#![forbid(clippy::allow_attributes)]

mod auth;
mod classifier;
pub mod configuration;
mod error;
mod executor;
pub mod logging;
mod materializer;
mod model;
mod result;
mod service;
mod target;

pub use auth::{AuthError, AuthGate, Principal};
pub use classifier::{ClassifiedError, ErrorKind};
pub use configuration::{Configuration, ConfigurationBuilder};
pub use error::{Error, Result};
pub use executor::{ExecutorConfig, QueryExecutor};
pub use materializer::{MAX_ROWS, RowRecord, materialize};
pub use model::{ConnectionSpec, QueryRequest};
pub use result::QueryResult;
pub use service::{QueryService, Response};
pub use target::{ConnectionTarget, PROTOCOL};
