//! Semantic data types for event attributes.
//!
//! This is the closed set of types the catalog can assign to a column.
//! Warehouse-native types are mapped onto it by [`crate::metadata`].

use serde::{Deserialize, Serialize};

/// Semantic type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Integer,
    Float,
    String,
    Date,
    Time,
    Timestamp,
    Boolean,
}

impl DataType {
    /// All data types, in declaration order.
    pub const ALL: [DataType; 7] = [
        DataType::Integer,
        DataType::Float,
        DataType::String,
        DataType::Date,
        DataType::Time,
        DataType::Timestamp,
        DataType::Boolean,
    ];

    /// Parse a data type name (case-insensitive).
    ///
    /// Accepts the canonical names plus a few common aliases
    /// (`int`, `bool`, `text`, `double`).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "integer" | "int" => Some(DataType::Integer),
            "float" | "double" => Some(DataType::Float),
            "string" | "text" => Some(DataType::String),
            "date" => Some(DataType::Date),
            "time" => Some(DataType::Time),
            "timestamp" => Some(DataType::Timestamp),
            "boolean" | "bool" => Some(DataType::Boolean),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::String => "string",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::Timestamp => "timestamp",
            DataType::Boolean => "boolean",
        }
    }

    /// Whether values of this type can be summed or averaged.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_from_str() {
        assert_eq!(DataType::from_str("integer"), Some(DataType::Integer));
        assert_eq!(DataType::from_str("INT"), Some(DataType::Integer));
        assert_eq!(DataType::from_str("Timestamp"), Some(DataType::Timestamp));
        assert_eq!(DataType::from_str("bool"), Some(DataType::Boolean));
        assert_eq!(DataType::from_str("decimal"), None);
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for ty in DataType::ALL {
            assert_eq!(DataType::from_str(&ty.to_string()), Some(ty));
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&DataType::Timestamp).unwrap();
        assert_eq!(json, "\"timestamp\"");
        let back: DataType = serde_json::from_str("\"boolean\"").unwrap();
        assert_eq!(back, DataType::Boolean);
    }
}
