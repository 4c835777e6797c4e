//! Native cell values.

use std::fmt;

use bytes::Bytes;

use crate::schema::NativeType;

/// A single non-null cell as the store holds it.
///
/// Decimals are unscaled; their scale comes from the column type.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// Boolean.
    Bool(bool),
    /// 8-bit signed integer.
    Int8(i8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// Microseconds since the Unix epoch.
    UnixtimeMicros(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string (also used for VARCHAR).
    String(String),
    /// Bytes, possibly sharing a scan batch buffer.
    Binary(Bytes),
    /// Unscaled decimal.
    Decimal(i128),
    /// Days since the Unix epoch.
    Date(i32),
}

impl NativeValue {
    /// Name of the variant, used in diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            NativeValue::Bool(_) => "bool",
            NativeValue::Int8(_) => "int8",
            NativeValue::Int16(_) => "int16",
            NativeValue::Int32(_) => "int32",
            NativeValue::Int64(_) => "int64",
            NativeValue::UnixtimeMicros(_) => "unixtime_micros",
            NativeValue::Float(_) => "float",
            NativeValue::Double(_) => "double",
            NativeValue::String(_) => "string",
            NativeValue::Binary(_) => "binary",
            NativeValue::Decimal(_) => "decimal",
            NativeValue::Date(_) => "date",
        }
    }

    /// Returns true if this value may be stored in a column of `native_type`.
    pub fn matches(&self, native_type: NativeType) -> bool {
        match (self, native_type) {
            (NativeValue::Bool(_), NativeType::Bool)
            | (NativeValue::Int8(_), NativeType::Int8)
            | (NativeValue::Int16(_), NativeType::Int16)
            | (NativeValue::Int32(_), NativeType::Int32)
            | (NativeValue::Int64(_), NativeType::Int64)
            | (NativeValue::UnixtimeMicros(_), NativeType::UnixtimeMicros)
            | (NativeValue::Float(_), NativeType::Float)
            | (NativeValue::Double(_), NativeType::Double)
            | (NativeValue::String(_), NativeType::String)
            | (NativeValue::Binary(_), NativeType::Binary)
            | (NativeValue::Date(_), NativeType::Date) => true,
            (NativeValue::String(s), NativeType::Varchar { max_length }) => {
                s.chars().count() <= usize::from(max_length)
            }
            (NativeValue::Decimal(unscaled), NativeType::Decimal { precision, .. }) => {
                decimal_fits(*unscaled, precision)
            }
            _ => false,
        }
    }

    /// Formats the value for a column of `native_type`.
    pub fn display_for(&self, native_type: NativeType) -> DisplayCell<'_> {
        DisplayCell {
            value: self,
            native_type,
        }
    }
}

/// Returns true if `unscaled` has at most `precision` digits.
pub fn decimal_fits(unscaled: i128, precision: u8) -> bool {
    let mut magnitude = unscaled.unsigned_abs();
    let mut digits = 1u8;
    while magnitude >= 10 {
        magnitude /= 10;
        digits += 1;
    }
    digits <= precision
}

/// Display adapter that renders decimals with their column scale.
pub struct DisplayCell<'a> {
    value: &'a NativeValue,
    native_type: NativeType,
}

impl fmt::Display for DisplayCell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.value, self.native_type) {
            (NativeValue::Decimal(unscaled), NativeType::Decimal { scale, .. }) if scale > 0 => {
                let divisor = 10u128.pow(u32::from(scale));
                let magnitude = unscaled.unsigned_abs();
                let sign = if *unscaled < 0 { "-" } else { "" };
                write!(
                    f,
                    "{}{}.{:0>width$}",
                    sign,
                    magnitude / divisor,
                    magnitude % divisor,
                    width = scale as usize
                )
            }
            (value, _) => write!(f, "{}", value),
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Bool(v) => write!(f, "{}", v),
            NativeValue::Int8(v) => write!(f, "{}", v),
            NativeValue::Int16(v) => write!(f, "{}", v),
            NativeValue::Int32(v) => write!(f, "{}", v),
            NativeValue::Int64(v) => write!(f, "{}", v),
            NativeValue::UnixtimeMicros(v) => write!(f, "{}us", v),
            NativeValue::Float(v) => write!(f, "{}", v),
            NativeValue::Double(v) => write!(f, "{}", v),
            NativeValue::String(v) => write!(f, "{}", v),
            NativeValue::Binary(v) => write!(f, "<{} bytes>", v.len()),
            NativeValue::Decimal(v) => write!(f, "{}", v),
            NativeValue::Date(v) => write!(f, "date:{}", v),
        }
    }
}
