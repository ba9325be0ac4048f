pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error
    #[error(transparent)]
    ConfigError(#[from] config::ConfigError),
    /// Driver error
    #[error(transparent)]
    DriverError(#[from] sqlgate_driver::Error),
    /// Error when a configuration value is not valid
    #[error("Invalid configuration {key}: {message}")]
    InvalidConfiguration { key: String, message: String },
    /// Error installing the tracing subscriber
    #[error("{0}")]
    LoggingError(String),
    /// Error when a request is rejected before any connection attempt
    #[error("{0}")]
    Validation(String),
}

/// Converts a [`sqlgate_driver::SqlError`] into a [`DriverError`](Error::DriverError)
impl From<sqlgate_driver::SqlError> for Error {
    fn from(error: sqlgate_driver::SqlError) -> Self {
        Error::DriverError(error.into())
    }
}
