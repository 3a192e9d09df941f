//! BigQuery standard SQL type names.

use super::NativeType;
use crate::types::DataType;

const NAMES: &[(&str, DataType)] = &[
    ("INT64", DataType::Integer),
    ("INTEGER", DataType::Integer),
    ("FLOAT64", DataType::Float),
    ("FLOAT", DataType::Float),
    ("NUMERIC", DataType::Float),
    ("BIGNUMERIC", DataType::Float),
    ("STRING", DataType::String),
    ("BYTES", DataType::String),
    ("JSON", DataType::String),
    ("GEOGRAPHY", DataType::String),
    ("DATE", DataType::Date),
    ("TIME", DataType::Time),
    ("TIMESTAMP", DataType::Timestamp),
    ("DATETIME", DataType::Timestamp),
    ("BOOL", DataType::Boolean),
    ("BOOLEAN", DataType::Boolean),
];

/// Client libraries report enum paths such as `SqlTypeNames.INT64`;
/// only the last segment is significant.
pub(super) fn data_type(native_type: &NativeType) -> Option<DataType> {
    let NativeType::Name(name) = native_type else {
        return None;
    };
    let name = name.trim().to_uppercase();
    let name = name.rsplit('.').next().unwrap_or_default();
    NAMES.iter().find(|(n, _)| *n == name).map(|(_, ty)| *ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(data_type(&"INT64".into()), Some(DataType::Integer));
        assert_eq!(data_type(&"bignumeric".into()), Some(DataType::Float));
        assert_eq!(data_type(&"GEOGRAPHY".into()), Some(DataType::String));
        assert_eq!(data_type(&"DATETIME".into()), Some(DataType::Timestamp));
    }

    #[test]
    fn test_dotted_enum_path() {
        assert_eq!(data_type(&"SqlTypeNames.BOOL".into()), Some(DataType::Boolean));
        assert_eq!(data_type(&"StandardSqlTypeNames.TIME".into()), Some(DataType::Time));
    }

    #[test]
    fn test_unmapped() {
        assert_eq!(data_type(&"STRUCT".into()), None);
        assert_eq!(data_type(&NativeType::Code(1)), None);
    }
}
