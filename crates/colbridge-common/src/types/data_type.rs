//! Semantic types of generic row fields.

use std::fmt;

/// A store-agnostic field type.
///
/// Every supported native column type of the remote store maps to exactly
/// one of these variants. Decimal carries its precision and scale as type
/// parameters so that schemas derived from the store keep them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 64-bit IEEE floating point.
    Float64,
    /// 32-bit IEEE floating point.
    Float32,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// UTF-8 string.
    String,
    /// Boolean.
    Boolean,
    /// Opaque bytes.
    Binary,
    /// Microseconds since the Unix epoch, UTC.
    Timestamp,
    /// Fixed-point decimal.
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Digits after the decimal point.
        scale: u8,
    },
}

impl DataType {
    /// Returns true for the integer and floating point types.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Float64
                | DataType::Float32
                | DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::Decimal { .. }
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Float64 => write!(f, "float64"),
            DataType::Float32 => write!(f, "float32"),
            DataType::Int8 => write!(f, "int8"),
            DataType::Int16 => write!(f, "int16"),
            DataType::Int32 => write!(f, "int32"),
            DataType::Int64 => write!(f, "int64"),
            DataType::String => write!(f, "string"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::Binary => write!(f, "binary"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::Decimal { precision, scale } => write!(f, "decimal({},{})", precision, scale),
        }
    }
}
