use sqlgate_driver::Error::IoError;
use sqlgate_driver::{Error, SqlError};

/// Converts an ODBC error; diagnostic records become a [`SqlError`].
pub(crate) fn to_error(error: odbc_api::Error) -> Error {
    match error {
        odbc_api::Error::Diagnostics { record, .. } => sql_error(
            record.state.as_str(),
            record.native_error,
            &String::from_utf8_lossy(&record.message),
        )
        .into(),
        error => IoError(error.to_string()),
    }
}

/// Builds a [`SqlError`] from the parts of an ODBC diagnostic record.
///
/// Driver messages are prefixed with the components that reported them, e.g.
/// `[IBM][System i Access ODBC Driver][DB2 for i5/OS]`; the prefix is dropped.
pub(crate) fn sql_error(state: &str, native_error: i32, message: &str) -> SqlError {
    let mut message = message.trim_end_matches('\0').trim();
    while let Some(rest) = message.strip_prefix('[') {
        match rest.split_once(']') {
            Some((_, rest)) => message = rest.trim_start(),
            None => break,
        }
    }
    SqlError::new(state.trim_end_matches('\0'), native_error, message)
}
