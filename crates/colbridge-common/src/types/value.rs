//! Generic field values.
//!
//! This module defines the `Value` type carried by generic rows on both the
//! write path (planned mutations) and the read path (scan results).

use std::fmt;

use chrono::{DateTime, Utc};

use super::{DataType, Decimal};

/// A single field value of a generic row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 8-bit signed integer.
    Int8(i8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit floating point.
    Float32(f32),
    /// 64-bit floating point.
    Float64(f64),
    /// String value.
    String(String),
    /// Binary data.
    Binary(Vec<u8>),
    /// Timestamp (microseconds since epoch, UTC).
    Timestamp(i64),
    /// Fixed-point decimal.
    Decimal(Decimal),
}

impl Value {
    /// Creates a timestamp value from a UTC date-time.
    ///
    /// Sub-microsecond precision is truncated.
    pub fn timestamp(dt: DateTime<Utc>) -> Self {
        Value::Timestamp(dt.timestamp_micros())
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the runtime variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Int8(_) => "Int8",
            Value::Int16(_) => "Int16",
            Value::Int32(_) => "Int32",
            Value::Int64(_) => "Int64",
            Value::Float32(_) => "Float32",
            Value::Float64(_) => "Float64",
            Value::String(_) => "String",
            Value::Binary(_) => "Binary",
            Value::Timestamp(_) => "Timestamp",
            Value::Decimal(_) => "Decimal",
        }
    }

    /// Returns the semantic type of this value, or `None` for NULL.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int8(_) => Some(DataType::Int8),
            Value::Int16(_) => Some(DataType::Int16),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float32(_) => Some(DataType::Float32),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::String),
            Value::Binary(_) => Some(DataType::Binary),
            Value::Timestamp(_) => Some(DataType::Timestamp),
            Value::Decimal(d) => Some(DataType::Decimal {
                precision: d.precision(),
                scale: d.scale(),
            }),
        }
    }

    /// Tries to get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Tries to get as a 64-bit integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Tries to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Tries to get as bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Tries to get as decimal.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Tries to get a timestamp as a UTC date-time.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(micros) => DateTime::from_timestamp_micros(*micros),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int8(i) => write!(f, "{}", i),
            Value::Int16(i) => write!(f, "{}", i),
            Value::Int32(i) => write!(f, "{}", i),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float32(fl) => write!(f, "{}", fl),
            Value::Float64(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
            Value::Binary(b) => write!(f, "<{} bytes>", b.len()),
            Value::Timestamp(micros) => match DateTime::from_timestamp_micros(*micros) {
                Some(dt) => write!(f, "{}", dt.to_rfc3339()),
                None => write!(f, "ts:{}", micros),
            },
            Value::Decimal(d) => write!(f, "{}", d),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
