use crate::{ClassifiedError, RowRecord};
use serde::Serialize;

/// Outcome of one query request.
///
/// Either `success` is set and `rows` are present, or `error` (and usually `errorDetails`)
/// is present.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    success: bool,
    execution_time_ms: u64,
    row_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<Vec<RowRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_details: Option<String>,
}

impl QueryResult {
    #[must_use]
    pub fn success(rows: Vec<RowRecord>, execution_time_ms: u64) -> Self {
        Self {
            success: true,
            execution_time_ms,
            row_count: rows.len(),
            rows: Some(rows),
            error: None,
            error_details: None,
        }
    }

    #[must_use]
    pub fn failure(error: ClassifiedError, execution_time_ms: u64) -> Self {
        let (error, error_details) = error.into_parts();
        Self {
            success: false,
            execution_time_ms,
            row_count: 0,
            rows: None,
            error: Some(error),
            error_details,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn execution_time_ms(&self) -> u64 {
        self.execution_time_ms
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Materialized rows; empty for a failed request
    #[must_use]
    pub fn rows(&self) -> &[RowRecord] {
        self.rows.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn error_details(&self) -> Option<&str> {
        self.error_details.as_deref()
    }

    /// Suggested HTTP status: 200 on success, 500 on any failure
    #[must_use]
    pub fn status_code(&self) -> u16 {
        if self.success { 200 } else { 500 }
    }
}
