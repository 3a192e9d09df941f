//! DuckDB relation dtypes.

use super::NativeType;
use crate::types::DataType;

const EXACT: &[(&str, DataType)] = &[
    ("TINYINT", DataType::Integer),
    ("SMALLINT", DataType::Integer),
    ("INTEGER", DataType::Integer),
    ("BIGINT", DataType::Integer),
    ("HUGEINT", DataType::Integer),
    ("UTINYINT", DataType::Integer),
    ("USMALLINT", DataType::Integer),
    ("UINTEGER", DataType::Integer),
    ("UBIGINT", DataType::Integer),
    ("REAL", DataType::Float),
    ("FLOAT", DataType::Float),
    ("DOUBLE", DataType::Float),
    ("VARCHAR", DataType::String),
    ("CHAR", DataType::String),
    ("TEXT", DataType::String),
    ("UUID", DataType::String),
    ("DATE", DataType::Date),
    ("BOOLEAN", DataType::Boolean),
];

/// Parameterised or suffixed families, checked in order.
/// `TIMESTAMP` must precede `TIME`.
const PREFIXES: &[(&str, DataType)] = &[
    ("DECIMAL", DataType::Float),
    ("NUMERIC", DataType::Float),
    ("TIMESTAMP", DataType::Timestamp),
    ("TIME", DataType::Time),
];

pub(super) fn data_type(native_type: &NativeType) -> Option<DataType> {
    let NativeType::Name(name) = native_type else {
        return None;
    };
    let name = name.trim().to_uppercase();
    EXACT
        .iter()
        .find(|(n, _)| *n == name)
        .or_else(|| PREFIXES.iter().find(|(p, _)| name.starts_with(p)))
        .map(|(_, ty)| *ty)
}
