//! Postgres type OIDs and type names.

use super::NativeType;
use crate::types::DataType;

/// Built-in `pg_type` OIDs.
const OIDS: &[(i64, &str)] = &[
    (16, "bool"),
    (20, "int8"),
    (21, "int2"),
    (23, "int4"),
    (25, "text"),
    (114, "json"),
    (700, "float4"),
    (701, "float8"),
    (1042, "bpchar"),
    (1043, "varchar"),
    (1082, "date"),
    (1083, "time"),
    (1114, "timestamp"),
    (1184, "timestamptz"),
    (1266, "timetz"),
    (1700, "numeric"),
    (2950, "uuid"),
    (3802, "jsonb"),
];

const NAMES: &[(&str, DataType)] = &[
    ("int2", DataType::Integer),
    ("int4", DataType::Integer),
    ("int8", DataType::Integer),
    ("numeric", DataType::Float),
    ("decimal", DataType::Float),
    ("float4", DataType::Float),
    ("float8", DataType::Float),
    ("text", DataType::String),
    ("varchar", DataType::String),
    ("bpchar", DataType::String),
    ("uuid", DataType::String),
    ("json", DataType::String),
    ("jsonb", DataType::String),
    ("date", DataType::Date),
    ("time", DataType::Time),
    ("timetz", DataType::Time),
    ("timestamp", DataType::Timestamp),
    ("timestamptz", DataType::Timestamp),
    ("bool", DataType::Boolean),
];

/// Substring fallbacks for driver-specific spellings, checked in order.
/// `timestamp` is checked before `date` and `time`.
const FRAGMENTS: &[(&str, DataType)] = &[
    ("int8", DataType::Integer),
    ("int16", DataType::Integer),
    ("int32", DataType::Integer),
    ("int64", DataType::Integer),
    ("numeric", DataType::Float),
    ("decimal", DataType::Float),
    ("float", DataType::Float),
    ("double", DataType::Float),
    ("string", DataType::String),
    ("text", DataType::String),
    ("json", DataType::String),
    ("uuid", DataType::String),
    ("timestamp", DataType::Timestamp),
    ("date", DataType::Date),
    ("time", DataType::Time),
    ("bool", DataType::Boolean),
];

pub(super) fn data_type(native_type: &NativeType) -> Option<DataType> {
    let name = match native_type {
        NativeType::Code(oid) => OIDS
            .iter()
            .find(|(o, _)| o == oid)
            .map(|(_, n)| n.to_string())?,
        NativeType::Name(name) => name.trim().to_lowercase(),
    };
    NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .or_else(|| FRAGMENTS.iter().find(|(f, _)| name.contains(f)))
        .map(|(_, ty)| *ty)
}
