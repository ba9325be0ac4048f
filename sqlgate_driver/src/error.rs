use std::error::Error as StdError;
use std::fmt;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failure reported by the database while connecting, preparing or executing
    #[error(transparent)]
    Sql(#[from] SqlError),
    /// Data type conversion error
    #[error("{0}")]
    ConversionError(String),
    /// Error when a driver for an identifier is not found
    #[error("driver not found for: {0}")]
    DriverNotFound(String),
    /// Error parsing a connection target
    #[error("{0}")]
    InvalidUrl(String),
    /// IO error
    #[error("{0}")]
    IoError(String),
    /// Error when parsing an integer
    #[error(transparent)]
    TryFromIntError(#[from] std::num::TryFromIntError),
    /// Error when a column type is not supported
    #[error("column type [{column_type}] is not supported for column [{column_name}]")]
    UnsupportedColumnType {
        column_name: String,
        column_type: String,
    },
}

/// Converts a [`std::io::Error`] into an [`IoError`](Error::IoError)
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IoError(error.to_string())
    }
}

/// Convert [`utf8 errors`](std::string::FromUtf8Error) to [`ConversionError`](Error::ConversionError)
impl From<std::string::FromUtf8Error> for Error {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Error::ConversionError(error.to_string())
    }
}

/// A database reported failure carrying the SQLSTATE, the vendor error code and, optionally,
/// the lower level failure that caused it.
#[derive(Debug)]
pub struct SqlError {
    sql_state: String,
    error_code: i32,
    message: String,
    cause: Option<Box<dyn StdError + Send + Sync>>,
}

impl SqlError {
    pub fn new<S, M>(sql_state: S, error_code: i32, message: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self {
            sql_state: sql_state.into(),
            error_code,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying failure, reported as the error [source](StdError::source).
    #[must_use]
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        self.cause = Some(cause.into());
        self
    }

    #[must_use]
    pub fn sql_state(&self) -> &str {
        &self.sql_state
    }

    #[must_use]
    pub fn error_code(&self) -> i32 {
        self.error_code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for SqlError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| &**cause as &(dyn StdError + 'static))
    }
}
