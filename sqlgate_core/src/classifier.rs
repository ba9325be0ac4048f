use crate::Error;
use std::error::Error as StdError;
use std::fmt::Write;

const REDACTED: &str = "****";

/// Failure category reported in a query result
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The request was rejected before connecting
    Validation,
    /// The database reported a failure while connecting, preparing or executing
    Sql,
    /// Anything else, e.g. a value that could not be converted
    Unexpected,
}

/// A failure mapped to the short `error` and diagnostic `errorDetails` of a query result.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassifiedError {
    kind: ErrorKind,
    error: String,
    details: Option<String>,
}

impl ClassifiedError {
    #[must_use]
    pub fn classify(error: &Error) -> Self {
        Self::classify_redacted(error, "")
    }

    /// Classify the error, masking the secret wherever the database or driver echoes it.
    ///
    /// Only whole words are masked, so a short secret does not rewrite unrelated text, and
    /// the SQLSTATE and error code are never touched.
    #[must_use]
    pub fn classify_redacted(error: &Error, secret: &str) -> Self {
        match error {
            Error::Validation(message) => Self {
                kind: ErrorKind::Validation,
                error: message.clone(),
                details: None,
            },
            Error::DriverError(sqlgate_driver::Error::Sql(sql_error)) => {
                let message = redact(sql_error.message(), secret);
                let mut details = format!(
                    "SQLState: {}\nError Code: {}\nMessage: {message}\n",
                    sql_error.sql_state(),
                    sql_error.error_code(),
                );
                if let Some(cause) = sql_error.source() {
                    let _ = writeln!(details, "Cause: {}", redact(&cause.to_string(), secret));
                }
                Self {
                    kind: ErrorKind::Sql,
                    error: format!("SQL Error: {message}"),
                    details: Some(details),
                }
            }
            error => Self {
                kind: ErrorKind::Unexpected,
                error: format!("Execution Error: {}", redact(&error.to_string(), secret)),
                details: Some(redact(&format!("{error:?}"), secret)),
            },
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn error(&self) -> &str {
        &self.error
    }

    #[must_use]
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub(crate) fn into_parts(self) -> (String, Option<String>) {
        (self.error, self.details)
    }
}

/// Replace each whole-word occurrence of the secret.
fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let word_start = secret.chars().next().is_some_and(is_word);
    let word_end = secret.chars().next_back().is_some_and(is_word);

    let mut redacted = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in text.match_indices(secret) {
        let end = start + secret.len();
        let joined_before = word_start && text[..start].chars().next_back().is_some_and(is_word);
        let joined_after = word_end && text[end..].chars().next().is_some_and(is_word);
        if joined_before || joined_after {
            continue;
        }
        redacted.push_str(&text[last..start]);
        redacted.push_str(REDACTED);
        last = end;
    }
    redacted.push_str(&text[last..]);
    redacted
}
