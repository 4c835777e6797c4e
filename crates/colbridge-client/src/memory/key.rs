//! Order-preserving encoding of primary keys.
//!
//! Rows in a memory table are kept in a `BTreeMap` keyed by the encoded
//! primary key, so byte order must match value order:
//! - signed integers flip the sign bit and are written big-endian
//! - floats map to their total-order bit pattern
//! - strings and binaries escape `0x00` as `0x00 0xFF` and end with `0x00 0x01`

use crate::schema::NativeSchema;
use crate::value::NativeValue;

/// Encodes the key columns of a row.
///
/// Returns the name of the first key column that has no value.
pub(crate) fn encode_key(
    schema: &NativeSchema,
    cells: &[Option<NativeValue>],
) -> Result<Vec<u8>, String> {
    let mut buf = Vec::with_capacity(16 * schema.key_column_count());
    for (column, cell) in schema
        .columns()
        .iter()
        .zip(cells)
        .take(schema.key_column_count())
    {
        let value = cell.as_ref().ok_or_else(|| column.name().to_string())?;
        encode_value(value, &mut buf);
    }
    Ok(buf)
}

fn encode_value(value: &NativeValue, buf: &mut Vec<u8>) {
    match value {
        NativeValue::Bool(b) => buf.push(u8::from(*b)),
        NativeValue::Int8(i) => buf.push((*i as u8) ^ 0x80),
        NativeValue::Int16(i) => buf.extend_from_slice(&((*i as u16) ^ 0x8000).to_be_bytes()),
        NativeValue::Int32(i) | NativeValue::Date(i) => {
            buf.extend_from_slice(&((*i as u32) ^ 0x8000_0000).to_be_bytes())
        }
        NativeValue::Int64(i) | NativeValue::UnixtimeMicros(i) => {
            buf.extend_from_slice(&((*i as u64) ^ 0x8000_0000_0000_0000).to_be_bytes())
        }
        NativeValue::Decimal(d) => buf.extend_from_slice(&((*d as u128) ^ (1u128 << 127)).to_be_bytes()),
        NativeValue::Float(f) => {
            let bits = f.to_bits();
            let ordered = if bits & 0x8000_0000 != 0 { !bits } else { bits ^ 0x8000_0000 };
            buf.extend_from_slice(&ordered.to_be_bytes());
        }
        NativeValue::Double(f) => {
            let bits = f.to_bits();
            let ordered = if bits & (1 << 63) != 0 { !bits } else { bits ^ (1 << 63) };
            buf.extend_from_slice(&ordered.to_be_bytes());
        }
        NativeValue::String(s) => encode_bytes(s.as_bytes(), buf),
        NativeValue::Binary(b) => encode_bytes(b, buf),
    }
}

fn encode_bytes(bytes: &[u8], buf: &mut Vec<u8>) {
    for &byte in bytes {
        buf.push(byte);
        if byte == 0x00 {
            buf.push(0xFF);
        }
    }
    buf.extend_from_slice(&[0x00, 0x01]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSchema, NativeType};

    fn key_of(schema: &NativeSchema, values: Vec<NativeValue>) -> Vec<u8> {
        let cells: Vec<_> = values.into_iter().map(Some).collect();
        encode_key(schema, &cells).unwrap()
    }

    #[test]
    fn test_integer_order() {
        let schema = NativeSchema::new(vec![ColumnSchema::key("id", NativeType::Int64)]).unwrap();
        let keys: Vec<_> = [-100i64, -1, 0, 1, 100]
            .iter()
            .map(|i| key_of(&schema, vec![NativeValue::Int64(*i)]))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_composite_string_order() {
        let schema = NativeSchema::new(vec![
            ColumnSchema::key("region", NativeType::String),
            ColumnSchema::key("id", NativeType::Int32),
        ])
        .unwrap();
        let a = key_of(&schema, vec![NativeValue::String("a".into()), NativeValue::Int32(9)]);
        let ab = key_of(&schema, vec![NativeValue::String("ab".into()), NativeValue::Int32(1)]);
        let b = key_of(&schema, vec![NativeValue::String("b".into()), NativeValue::Int32(0)]);
        assert!(a < ab);
        assert!(ab < b);
    }

    #[test]
    fn test_float_order() {
        let schema = NativeSchema::new(vec![ColumnSchema::key("f", NativeType::Double)]).unwrap();
        let neg = key_of(&schema, vec![NativeValue::Double(-2.5)]);
        let zero = key_of(&schema, vec![NativeValue::Double(0.0)]);
        let pos = key_of(&schema, vec![NativeValue::Double(1.5)]);
        assert!(neg < zero && zero < pos);
    }

    #[test]
    fn test_missing_key_column() {
        let schema = NativeSchema::new(vec![
            ColumnSchema::key("id", NativeType::Int64),
            ColumnSchema::new("name", NativeType::String),
        ])
        .unwrap();
        assert_eq!(encode_key(&schema, &[None, None]), Err("id".to_string()));
    }
}
