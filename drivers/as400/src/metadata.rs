use odbc_api::DataType;
use sqlgate_driver::SqlType;

/// Maps the ODBC type of a result column to its DB2 for i type family.
pub(crate) fn sql_type(data_type: DataType) -> SqlType {
    match data_type {
        DataType::SmallInt | DataType::TinyInt => SqlType::SmallInt,
        DataType::Integer => SqlType::Integer,
        DataType::BigInt => SqlType::BigInt,
        DataType::Real => SqlType::Real,
        DataType::Float { .. } | DataType::Double => SqlType::Double,
        DataType::Decimal { .. } => SqlType::Decimal,
        DataType::Numeric { .. } => SqlType::Numeric,
        DataType::Char { .. } => SqlType::Char,
        DataType::Varchar { .. } => SqlType::VarChar,
        DataType::LongVarchar { .. } => SqlType::Clob,
        DataType::WChar { .. } => SqlType::Graphic,
        DataType::WVarchar { .. } => SqlType::VarGraphic,
        DataType::Binary { .. } => SqlType::Binary,
        DataType::Varbinary { .. } => SqlType::VarBinary,
        DataType::LongVarbinary { .. } => SqlType::Blob,
        DataType::Date => SqlType::Date,
        DataType::Time { .. } => SqlType::Time,
        DataType::Timestamp { .. } => SqlType::Timestamp,
        DataType::Bit => SqlType::Boolean,
        other => SqlType::Other(format!("{other:?}")),
    }
}

/// Binary columns are fetched as bytes, everything else as text.
pub(crate) fn is_binary(sql_type: &SqlType) -> bool {
    matches!(
        sql_type,
        SqlType::Binary | SqlType::VarBinary | SqlType::Blob
    )
}
