//! Conversions between store column types and generic types.
//!
//! Every type-specific conversion in the bridge goes through this module.
//! The supported store types and their generic counterparts are:
//!
//! | Store type        | Generic type        | Value variant        |
//! |-------------------|---------------------|----------------------|
//! | `DOUBLE`          | `float64`           | `Value::Float64`     |
//! | `FLOAT`           | `float32`           | `Value::Float32`     |
//! | `INT8`            | `int8`              | `Value::Int8`        |
//! | `INT16`           | `int16`             | `Value::Int16`       |
//! | `INT32`           | `int32`             | `Value::Int32`       |
//! | `INT64`           | `int64`             | `Value::Int64`       |
//! | `STRING`          | `string`            | `Value::String`      |
//! | `BOOL`            | `boolean`           | `Value::Boolean`     |
//! | `BINARY`          | `binary`            | `Value::Binary`      |
//! | `UNIXTIME_MICROS` | `timestamp`         | `Value::Timestamp`   |
//! | `DECIMAL(p, s)`   | `decimal(p,s)`      | `Value::Decimal`     |
//!
//! Any other store type is rejected with [`BridgeError::UnsupportedType`].
//! Values are never coerced between widths.

use std::sync::Arc;

use colbridge_client::{ColumnSchema, NativeSchema, NativeType, NativeValue, PartialRow, RowResult};
use colbridge_common::{DataType, Decimal, Field, Row, RowSchema, Value};

use crate::error::{BridgeError, BridgeResult};

/// Identifies the table and row a value is converted for, so that
/// conversion errors can name them.
#[derive(Debug, Clone, Copy)]
pub struct WriteContext<'a> {
    /// Target table name.
    pub table: &'a str,
    /// The row the value comes from.
    pub row: &'a Row,
}

impl<'a> WriteContext<'a> {
    /// Creates a context.
    pub fn new(table: &'a str, row: &'a Row) -> Self {
        Self { table, row }
    }
}

fn unsupported(column: &ColumnSchema) -> BridgeError {
    BridgeError::UnsupportedType {
        column: column.name().to_string(),
        native_type: column.native_type(),
    }
}

/// Returns the generic type of a store column.
pub fn native_to_semantic(column: &ColumnSchema) -> BridgeResult<DataType> {
    Ok(match column.native_type() {
        NativeType::Double => DataType::Float64,
        NativeType::Float => DataType::Float32,
        NativeType::Int8 => DataType::Int8,
        NativeType::Int16 => DataType::Int16,
        NativeType::Int32 => DataType::Int32,
        NativeType::Int64 => DataType::Int64,
        NativeType::String => DataType::String,
        NativeType::Bool => DataType::Boolean,
        NativeType::Binary => DataType::Binary,
        NativeType::UnixtimeMicros => DataType::Timestamp,
        NativeType::Decimal { precision, scale } => DataType::Decimal { precision, scale },
        NativeType::Date | NativeType::Varchar { .. } | NativeType::Array => {
            return Err(unsupported(column))
        }
    })
}

/// Derives the generic schema of a table, in column order.
///
/// Every field is nullable.
pub fn schema_for(schema: &NativeSchema) -> BridgeResult<RowSchema> {
    let fields = schema
        .columns()
        .iter()
        .map(|column| Ok(Field::nullable(column.name(), native_to_semantic(column)?)))
        .collect::<BridgeResult<Vec<_>>>()?;
    Ok(RowSchema::new(fields))
}

/// Converts a generic value to the store representation of a column.
///
/// Returns `None` for NULL.
pub fn value_to_native(
    value: &Value,
    column: &ColumnSchema,
    context: &WriteContext<'_>,
) -> BridgeResult<Option<NativeValue>> {
    if value.is_null() {
        return Ok(None);
    }

    let native_type = column.native_type();
    let native = match (native_type, value) {
        (NativeType::Double, Value::Float64(v)) => NativeValue::Double(*v),
        (NativeType::Float, Value::Float32(v)) => NativeValue::Float(*v),
        (NativeType::Int8, Value::Int8(v)) => NativeValue::Int8(*v),
        (NativeType::Int16, Value::Int16(v)) => NativeValue::Int16(*v),
        (NativeType::Int32, Value::Int32(v)) => NativeValue::Int32(*v),
        (NativeType::Int64, Value::Int64(v)) => NativeValue::Int64(*v),
        (NativeType::String, Value::String(v)) => NativeValue::String(v.clone()),
        (NativeType::Bool, Value::Boolean(v)) => NativeValue::Bool(*v),
        (NativeType::Binary, Value::Binary(v)) => NativeValue::Binary(v.clone().into()),
        (NativeType::UnixtimeMicros, Value::Timestamp(v)) => NativeValue::UnixtimeMicros(*v),
        (NativeType::Decimal { precision, scale }, Value::Decimal(d)) => {
            let rescaled =
                d.rescale(precision, scale)
                    .ok_or_else(|| BridgeError::DecimalOutOfRange {
                        table: context.table.to_string(),
                        field: column.name().to_string(),
                        expected: native_type,
                        value: *d,
                    })?;
            NativeValue::Decimal(rescaled.unscaled())
        }
        (NativeType::Date | NativeType::Varchar { .. } | NativeType::Array, _) => {
            return Err(unsupported(column))
        }
        (_, other) => {
            return Err(BridgeError::TypeMismatch {
                table: context.table.to_string(),
                field: column.name().to_string(),
                expected: native_type,
                actual: other.type_name(),
                row: Box::new(context.row.clone()),
            })
        }
    };
    Ok(Some(native))
}

/// Writes a generic value into a row buffer.
///
/// NULL leaves the column unset.
pub fn semantic_to_native(
    value: &Value,
    column: &ColumnSchema,
    target: &mut PartialRow,
    context: &WriteContext<'_>,
) -> BridgeResult<()> {
    if let Some(native) = value_to_native(value, column, context)? {
        target.set(column.name(), native)?;
    }
    Ok(())
}

/// Converts a filter value to an in-list literal for a column.
///
/// NULL yields `None`: an in-list cannot match NULL.
pub fn value_to_predicate_value(
    value: &Value,
    column: &ColumnSchema,
    context: &WriteContext<'_>,
) -> BridgeResult<Option<NativeValue>> {
    value_to_native(value, column, context)
}

/// Reads one cell of a scan result as a generic value.
///
/// Binary cells are copied out of the scan batch buffer.
pub fn native_to_value(result: &RowResult, column: &ColumnSchema) -> BridgeResult<Value> {
    let name = column.name();
    if result.is_null(name)? {
        return Ok(Value::Null);
    }

    Ok(match column.native_type() {
        NativeType::Double => Value::Float64(result.get_f64(name)?),
        NativeType::Float => Value::Float32(result.get_f32(name)?),
        NativeType::Int8 => Value::Int8(result.get_i8(name)?),
        NativeType::Int16 => Value::Int16(result.get_i16(name)?),
        NativeType::Int32 => Value::Int32(result.get_i32(name)?),
        NativeType::Int64 => Value::Int64(result.get_i64(name)?),
        NativeType::String => Value::String(result.get_string(name)?.to_string()),
        NativeType::Bool => Value::Boolean(result.get_bool(name)?),
        NativeType::Binary => Value::Binary(result.get_binary_copy(name)?),
        NativeType::UnixtimeMicros => Value::Timestamp(result.get_timestamp_micros(name)?),
        NativeType::Decimal { precision, scale } => {
            Value::Decimal(Decimal::new(result.get_decimal(name)?, precision, scale)?)
        }
        NativeType::Date | NativeType::Varchar { .. } | NativeType::Array => {
            return Err(unsupported(column))
        }
    })
}

/// Converts a whole scan result into a generic row carrying `schema`.
pub fn result_to_row(result: &RowResult, schema: Arc<RowSchema>) -> BridgeResult<Row> {
    let values = result
        .schema()
        .columns()
        .iter()
        .map(|column| native_to_value(result, column))
        .collect::<BridgeResult<Vec<_>>>()?;
    Ok(Row::with_schema(schema, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::{TimeZone, Utc};

    fn decimal_type() -> NativeType {
        NativeType::Decimal {
            precision: 10,
            scale: 2,
        }
    }

    fn all_types() -> Arc<NativeSchema> {
        Arc::new(
            NativeSchema::new(vec![
                ColumnSchema::key("c_int64", NativeType::Int64),
                ColumnSchema::new("c_double", NativeType::Double),
                ColumnSchema::new("c_float", NativeType::Float),
                ColumnSchema::new("c_int8", NativeType::Int8),
                ColumnSchema::new("c_int16", NativeType::Int16),
                ColumnSchema::new("c_int32", NativeType::Int32),
                ColumnSchema::new("c_string", NativeType::String),
                ColumnSchema::new("c_bool", NativeType::Bool),
                ColumnSchema::new("c_binary", NativeType::Binary),
                ColumnSchema::new("c_timestamp", NativeType::UnixtimeMicros),
                ColumnSchema::new("c_decimal", decimal_type()),
            ])
            .unwrap(),
        )
    }

    fn sample_values() -> Vec<Value> {
        vec![
            Value::Int64(-9_000_000_000),
            Value::Float64(2.5),
            Value::Float32(-1.25),
            Value::Int8(-8),
            Value::Int16(1600),
            Value::Int32(-320_000),
            Value::String("café".to_string()),
            Value::Boolean(true),
            Value::Binary(vec![0, 1, 2, 255]),
            Value::timestamp(Utc.with_ymd_and_hms(2024, 2, 29, 12, 30, 0).unwrap()),
            Value::Decimal(Decimal::new(-12345, 10, 2).unwrap()),
        ]
    }

    #[test]
    fn test_schema_for_all_types() {
        let schema = schema_for(&all_types()).unwrap();
        assert_eq!(
            schema.to_string(),
            "struct<c_int64:int64,c_double:float64,c_float:float32,c_int8:int8,c_int16:int16,\
             c_int32:int32,c_string:string,c_bool:boolean,c_binary:binary,\
             c_timestamp:timestamp,c_decimal:decimal(10,2)>"
        );
        assert!(schema.fields().iter().all(|f| f.nullable));
    }

    #[test]
    fn test_round_trip_every_type() {
        let native = all_types();
        let planned = Row::new(sample_values());
        let context = WriteContext::new("t", &planned);

        let mut buffer = PartialRow::new(Arc::clone(&native));
        for (column, value) in native.columns().iter().zip(planned.values()) {
            semantic_to_native(value, column, &mut buffer, &context).unwrap();
        }

        let result = RowResult::new(Arc::clone(&native), buffer.cells().to_vec());
        let row = result_to_row(&result, Arc::new(schema_for(&native).unwrap())).unwrap();
        assert_eq!(row.values(), planned.values());
    }

    #[test]
    fn test_decimal_rescaled_exactly() {
        let column = ColumnSchema::new("amount", decimal_type());
        let planned = Row::new(vec![]);
        let context = WriteContext::new("t", &planned);

        let value = Value::Decimal("3.5".parse().unwrap());
        assert_eq!(
            value_to_native(&value, &column, &context).unwrap(),
            Some(NativeValue::Decimal(350))
        );

        let too_fine = Value::Decimal("3.505".parse().unwrap());
        assert!(matches!(
            value_to_native(&too_fine, &column, &context),
            Err(BridgeError::DecimalOutOfRange { .. })
        ));

        let too_wide = Value::Decimal("123456789.5".parse().unwrap());
        assert!(matches!(
            value_to_native(&too_wide, &column, &context),
            Err(BridgeError::DecimalOutOfRange { .. })
        ));
    }

    #[test]
    fn test_null_is_never_written() {
        let native = all_types();
        let planned = Row::new(vec![Value::Null]);
        let context = WriteContext::new("t", &planned);
        let mut buffer = PartialRow::new(Arc::clone(&native));

        for column in native.columns() {
            semantic_to_native(&Value::Null, column, &mut buffer, &context).unwrap();
        }
        assert!(buffer.cells().iter().all(Option::is_none));
    }

    #[test]
    fn test_no_width_coercion() {
        let column = ColumnSchema::key("id", NativeType::Int64);
        let planned = Row::builder().field("id", DataType::Int32, 7i32).build();
        let context = WriteContext::new("orders", &planned);

        match value_to_native(&Value::Int32(7), &column, &context) {
            Err(BridgeError::TypeMismatch {
                table,
                field,
                expected,
                actual,
                row,
            }) => {
                assert_eq!(table, "orders");
                assert_eq!(field, "id");
                assert_eq!(expected, NativeType::Int64);
                assert_eq!(actual, "Int32");
                assert_eq!(*row, planned);
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }

        let column = ColumnSchema::new("ratio", NativeType::Double);
        assert!(matches!(
            value_to_native(&Value::Float32(0.5), &column, &context),
            Err(BridgeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unsupported_types() {
        for native_type in [
            NativeType::Date,
            NativeType::Varchar { max_length: 10 },
            NativeType::Array,
        ] {
            let column = ColumnSchema::new("x", native_type);
            match native_to_semantic(&column) {
                Err(BridgeError::UnsupportedType { native_type: t, .. }) => {
                    assert_eq!(t, native_type)
                }
                other => panic!("expected unsupported type, got {:?}", other),
            }
        }

        let schema = NativeSchema::new(vec![
            ColumnSchema::key("id", NativeType::Int64),
            ColumnSchema::new("day", NativeType::Date),
        ])
        .unwrap();
        assert!(schema_for(&schema).is_err());
    }

    #[test]
    fn test_binary_read_is_detached() {
        let native = Arc::new(
            NativeSchema::new(vec![
                ColumnSchema::key("id", NativeType::Int64),
                ColumnSchema::new("payload", NativeType::Binary),
            ])
            .unwrap(),
        );
        let buffer = Bytes::from_static(b"abcdefg");
        let result = RowResult::new(
            Arc::clone(&native),
            vec![
                Some(NativeValue::Int64(1)),
                Some(NativeValue::Binary(buffer.slice(2..5))),
            ],
        );
        let value = native_to_value(&result, &native.columns()[1]).unwrap();
        assert_eq!(value, Value::Binary(b"cde".to_vec()));
        assert_ne!(value.as_bytes().unwrap().as_ptr(), buffer[2..].as_ptr());
    }
}
