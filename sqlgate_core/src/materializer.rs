use crate::error::Result;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use sqlgate_driver::Error::ConversionError;
use sqlgate_driver::{Cursor, Value};
use std::sync::Arc;
use tracing::debug;

/// Maximum number of rows materialized for a single query
pub const MAX_ROWS: usize = 10_000;

/// One result row: values keyed by column name, in column order.
///
/// Duplicate column names are kept positionally. Column names are shared by all rows of a
/// result.
#[derive(Clone, Debug, PartialEq)]
pub struct RowRecord {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl RowRecord {
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value of the first column with the given name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|column| column == name)
            .and_then(|index| self.values.get(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl Serialize for RowRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Drain the cursor into row records, stopping after `max_rows` rows.
///
/// # Errors
/// * If the cursor fails to produce a row
/// * If a row does not match the column metadata
/// * If a value cannot be converted to its column type; the error names the column
pub async fn materialize(
    cursor: &mut (dyn Cursor + '_),
    max_rows: usize,
) -> Result<Vec<RowRecord>> {
    let columns: Arc<[String]> = cursor
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();
    let sql_types: Vec<_> = cursor
        .columns()
        .iter()
        .map(|column| column.sql_type().clone())
        .collect();

    let mut rows = Vec::new();
    while rows.len() < max_rows {
        let Some(row) = cursor.next().await? else {
            return Ok(rows);
        };
        if row.len() != sql_types.len() {
            return Err(ConversionError(format!(
                "row has {} values but the result has {} columns",
                row.len(),
                sql_types.len()
            ))
            .into());
        }

        let values = row
            .into_iter()
            .zip(columns.iter().zip(sql_types.iter()))
            .map(|(value, (column, sql_type))| {
                sql_type
                    .convert(value)
                    .map_err(|error| ConversionError(format!("column [{column}]: {error}")))
            })
            .collect::<sqlgate_driver::Result<Vec<Value>>>()?;
        rows.push(RowRecord {
            columns: Arc::clone(&columns),
            values,
        });
    }

    debug!("Row limit of {max_rows} reached; remaining rows are discarded");
    Ok(rows)
}
