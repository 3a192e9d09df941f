//! Snowflake cursor type codes.

use super::NativeType;
use crate::types::DataType;

/// `cursor.description` type codes from the Snowflake connector.
const TYPE_CODES: &[(i64, DataType)] = &[
    (0, DataType::Integer),   // FIXED
    (1, DataType::Float),     // REAL
    (2, DataType::String),    // TEXT
    (3, DataType::Date),      // DATE
    (6, DataType::Timestamp), // TIMESTAMP_LTZ
    (7, DataType::Timestamp), // TIMESTAMP_TZ
    (8, DataType::Timestamp), // TIMESTAMP_NTZ
    (12, DataType::Time),     // TIME
    (13, DataType::Boolean),  // BOOLEAN
];

pub(super) fn data_type(native_type: &NativeType) -> Option<DataType> {
    let code = match native_type {
        NativeType::Code(code) => *code,
        NativeType::Name(name) => name.trim().parse().ok()?,
    };
    TYPE_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, ty)| *ty)
}
