use crate::Error::ConversionError;
use crate::Value;
use crate::error::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// SQL type family reported by a driver for a result column.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum SqlType {
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Decimal,
    Numeric,
    Char,
    VarChar,
    Clob,
    Graphic,
    VarGraphic,
    Binary,
    VarBinary,
    Blob,
    Date,
    Time,
    Timestamp,
    Boolean,
    Other(String),
}

impl SqlType {
    /// Convert a driver reported value into the canonical [`Value`] variant for this type.
    ///
    /// `Null` is accepted for every type. [`SqlType::Other`] passes values through unchanged.
    ///
    /// # Errors
    /// * If the value cannot be represented by this type
    pub fn convert(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        let converted = match self {
            SqlType::SmallInt => {
                to_integer(&value).and_then(|v| i16::try_from(v).ok().map(Value::I16))
            }
            SqlType::Integer => {
                to_integer(&value).and_then(|v| i32::try_from(v).ok().map(Value::I32))
            }
            SqlType::BigInt => to_integer(&value).map(Value::I64),
            SqlType::Real => to_float(&value).map(|v| Value::F32(v as f32)),
            SqlType::Double => to_float(&value).map(Value::F64),
            SqlType::Decimal | SqlType::Numeric => to_decimal(&value).map(Value::Decimal),
            SqlType::Char
            | SqlType::VarChar
            | SqlType::Clob
            | SqlType::Graphic
            | SqlType::VarGraphic => to_text(value.clone()).map(Value::String),
            SqlType::Binary | SqlType::VarBinary | SqlType::Blob => match &value {
                Value::Bytes(bytes) => Some(Value::Bytes(bytes.clone())),
                Value::String(text) => Some(Value::Bytes(text.as_bytes().to_vec())),
                _ => None,
            },
            SqlType::Date => match &value {
                Value::Date(date) => Some(Value::Date(*date)),
                Value::DateTime(date_time) => Some(Value::Date(date_time.date())),
                Value::String(text) => NaiveDate::from_str(text.trim()).ok().map(Value::Date),
                _ => None,
            },
            SqlType::Time => match &value {
                Value::Time(time) => Some(Value::Time(*time)),
                Value::DateTime(date_time) => Some(Value::Time(date_time.time())),
                Value::String(text) => NaiveTime::from_str(text.trim()).ok().map(Value::Time),
                _ => None,
            },
            SqlType::Timestamp => match &value {
                Value::DateTime(date_time) => Some(Value::DateTime(*date_time)),
                Value::Date(date) => date.and_hms_opt(0, 0, 0).map(Value::DateTime),
                Value::String(text) => parse_timestamp(text.trim()).map(Value::DateTime),
                _ => None,
            },
            SqlType::Boolean => match &value {
                Value::Bool(flag) => Some(Value::Bool(*flag)),
                Value::I16(0) | Value::I32(0) | Value::I64(0) => Some(Value::Bool(false)),
                Value::I16(1) | Value::I32(1) | Value::I64(1) => Some(Value::Bool(true)),
                Value::String(text) => match text.trim().to_lowercase().as_str() {
                    "true" | "1" => Some(Value::Bool(true)),
                    "false" | "0" => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            SqlType::Other(_) => Some(value.clone()),
        };

        converted.ok_or_else(|| {
            ConversionError(format!(
                "cannot convert {} value [{value}] to {self}",
                value.type_name()
            ))
        })
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Real => "REAL",
            SqlType::Double => "DOUBLE",
            SqlType::Decimal => "DECIMAL",
            SqlType::Numeric => "NUMERIC",
            SqlType::Char => "CHAR",
            SqlType::VarChar => "VARCHAR",
            SqlType::Clob => "CLOB",
            SqlType::Graphic => "GRAPHIC",
            SqlType::VarGraphic => "VARGRAPHIC",
            SqlType::Binary => "BINARY",
            SqlType::VarBinary => "VARBINARY",
            SqlType::Blob => "BLOB",
            SqlType::Date => "DATE",
            SqlType::Time => "TIME",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Other(name) => name.as_str(),
        };
        write!(f, "{name}")
    }
}

fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::I16(v) => Some(i64::from(*v)),
        Value::I32(v) => Some(i64::from(*v)),
        Value::I64(v) => Some(*v),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::I16(v) => Some(f64::from(*v)),
        Value::I32(v) => Some(f64::from(*v)),
        Value::F32(v) => Some(f64::from(*v)),
        Value::F64(v) => Some(*v),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::I16(v) => Some(Decimal::from(*v)),
        Value::I32(v) => Some(Decimal::from(*v)),
        Value::I64(v) => Some(Decimal::from(*v)),
        Value::F32(v) => Decimal::from_str(&v.to_string()).ok(),
        Value::F64(v) => Decimal::from_str(&v.to_string()).ok(),
        Value::Decimal(v) => Some(*v),
        Value::String(text) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    }
}

fn to_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Bytes(bytes) => String::from_utf8(bytes).ok(),
        other => Some(other.to_string()),
    }
}

/// Accepts ISO-8601 (`T` separator) as well as the `yyyy-mm-dd-hh.mm.ss.ffffff` form
/// used by DB2 for i.
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d-%H.%M.%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// A column of a query result as described by the driver.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Column {
    name: String,
    sql_type: SqlType,
}

impl Column {
    pub fn new<S: Into<String>>(name: S, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn sql_type(&self) -> &SqlType {
        &self.sql_type
    }
}
