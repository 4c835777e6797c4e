//! Row buffers: partial rows for writes, row results for scans.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{StoreError, StoreResult};
use crate::schema::{ColumnSchema, NativeSchema, NativeType};
use crate::value::NativeValue;

/// A write buffer with one optional cell per table column.
///
/// Columns left unset are not sent to the store: an update leaves them
/// unchanged and an insert falls back to NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialRow {
    schema: Arc<NativeSchema>,
    cells: Vec<Option<NativeValue>>,
    unresolved: Vec<String>,
}

impl PartialRow {
    /// Creates an empty row for the schema.
    pub fn new(schema: Arc<NativeSchema>) -> Self {
        let cells = vec![None; schema.column_count()];
        Self {
            schema,
            cells,
            unresolved: Vec::new(),
        }
    }

    /// Returns the table schema.
    pub fn schema(&self) -> &Arc<NativeSchema> {
        &self.schema
    }

    /// Sets a cell, checking the value against the column type.
    pub fn set(&mut self, name: &str, value: NativeValue) -> StoreResult<()> {
        let index = self
            .schema
            .column_index(name)
            .ok_or_else(|| StoreError::ColumnNotFound(name.to_string()))?;
        let native_type = self.schema.columns()[index].native_type();

        if !value.matches(native_type) {
            return Err(match (&value, native_type) {
                (NativeValue::Decimal(_), NativeType::Decimal { .. }) => {
                    StoreError::DecimalOutOfRange {
                        column: name.to_string(),
                        expected: native_type,
                    }
                }
                _ => StoreError::ColumnTypeMismatch {
                    column: name.to_string(),
                    expected: native_type,
                    requested: value.type_name(),
                },
            });
        }

        self.cells[index] = Some(value);
        Ok(())
    }

    /// Sets a BOOL cell.
    pub fn add_bool(&mut self, name: &str, value: bool) -> StoreResult<()> {
        self.set(name, NativeValue::Bool(value))
    }

    /// Sets an INT8 cell.
    pub fn add_i8(&mut self, name: &str, value: i8) -> StoreResult<()> {
        self.set(name, NativeValue::Int8(value))
    }

    /// Sets an INT16 cell.
    pub fn add_i16(&mut self, name: &str, value: i16) -> StoreResult<()> {
        self.set(name, NativeValue::Int16(value))
    }

    /// Sets an INT32 cell.
    pub fn add_i32(&mut self, name: &str, value: i32) -> StoreResult<()> {
        self.set(name, NativeValue::Int32(value))
    }

    /// Sets an INT64 cell.
    pub fn add_i64(&mut self, name: &str, value: i64) -> StoreResult<()> {
        self.set(name, NativeValue::Int64(value))
    }

    /// Sets a FLOAT cell.
    pub fn add_f32(&mut self, name: &str, value: f32) -> StoreResult<()> {
        self.set(name, NativeValue::Float(value))
    }

    /// Sets a DOUBLE cell.
    pub fn add_f64(&mut self, name: &str, value: f64) -> StoreResult<()> {
        self.set(name, NativeValue::Double(value))
    }

    /// Sets a STRING or VARCHAR cell.
    pub fn add_string(&mut self, name: &str, value: impl Into<String>) -> StoreResult<()> {
        self.set(name, NativeValue::String(value.into()))
    }

    /// Sets a BINARY cell.
    pub fn add_binary(&mut self, name: &str, value: impl Into<Bytes>) -> StoreResult<()> {
        self.set(name, NativeValue::Binary(value.into()))
    }

    /// Sets a UNIXTIME_MICROS cell.
    pub fn add_timestamp_micros(&mut self, name: &str, micros: i64) -> StoreResult<()> {
        self.set(name, NativeValue::UnixtimeMicros(micros))
    }

    /// Sets a DECIMAL cell from a value already scaled to the column scale.
    pub fn add_decimal(&mut self, name: &str, unscaled: i128) -> StoreResult<()> {
        self.set(name, NativeValue::Decimal(unscaled))
    }

    /// Returns true if the named column has been set.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the cell of the named column, if set.
    pub fn get(&self, name: &str) -> Option<&NativeValue> {
        self.schema
            .column_index(name)
            .and_then(|index| self.cells[index].as_ref())
    }

    /// Returns all cells in column order.
    pub fn cells(&self) -> &[Option<NativeValue>] {
        &self.cells
    }

    /// Iterates over the names of the columns that have been set.
    pub fn set_column_names(&self) -> impl Iterator<Item = &str> {
        self.schema
            .columns()
            .iter()
            .zip(&self.cells)
            .filter(|(_, cell)| cell.is_some())
            .map(|(column, _)| column.name())
    }

    /// Records a field name that matched no column of the table.
    ///
    /// The store rejects operations carrying unresolved columns when they
    /// are applied.
    pub fn mark_unresolved(&mut self, name: impl Into<String>) {
        self.unresolved.push(name.into());
    }

    /// Returns the field names that matched no column.
    pub fn unresolved_columns(&self) -> &[String] {
        &self.unresolved
    }
}

impl fmt::Display for PartialRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (column, cell) in self.schema.columns().iter().zip(&self.cells) {
            if let Some(value) = cell {
                if !first {
                    write!(f, ", ")?;
                }
                first = false;
                write!(f, "{}={}", column.name(), value.display_for(column.native_type()))?;
            }
        }
        for name in &self.unresolved {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}=?", name)?;
        }
        Ok(())
    }
}

/// One row returned by a scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct RowResult {
    schema: Arc<NativeSchema>,
    cells: Vec<Option<NativeValue>>,
}

impl RowResult {
    /// Creates a row result. `cells` follows the schema's column order.
    pub fn new(schema: Arc<NativeSchema>, cells: Vec<Option<NativeValue>>) -> Self {
        debug_assert_eq!(schema.column_count(), cells.len());
        Self { schema, cells }
    }

    /// Returns the schema of the scanned table.
    pub fn schema(&self) -> &Arc<NativeSchema> {
        &self.schema
    }

    fn locate(&self, name: &str) -> StoreResult<(&ColumnSchema, Option<&NativeValue>)> {
        let index = self
            .schema
            .column_index(name)
            .ok_or_else(|| StoreError::ColumnNotFound(name.to_string()))?;
        Ok((&self.schema.columns()[index], self.cells[index].as_ref()))
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        requested: &'static str,
        extract: impl FnOnce(&'a NativeValue) -> Option<T>,
    ) -> StoreResult<T> {
        let (column, cell) = self.locate(name)?;
        let cell = cell.ok_or_else(|| StoreError::NullValue(name.to_string()))?;
        extract(cell).ok_or_else(|| StoreError::ColumnTypeMismatch {
            column: name.to_string(),
            expected: column.native_type(),
            requested,
        })
    }

    /// Returns true if the named cell is NULL.
    pub fn is_null(&self, name: &str) -> StoreResult<bool> {
        Ok(self.locate(name)?.1.is_none())
    }

    /// Reads a BOOL cell.
    pub fn get_bool(&self, name: &str) -> StoreResult<bool> {
        self.typed(name, "bool", |v| match v {
            NativeValue::Bool(b) => Some(*b),
            _ => None,
        })
    }

    /// Reads an INT8 cell.
    pub fn get_i8(&self, name: &str) -> StoreResult<i8> {
        self.typed(name, "int8", |v| match v {
            NativeValue::Int8(i) => Some(*i),
            _ => None,
        })
    }

    /// Reads an INT16 cell.
    pub fn get_i16(&self, name: &str) -> StoreResult<i16> {
        self.typed(name, "int16", |v| match v {
            NativeValue::Int16(i) => Some(*i),
            _ => None,
        })
    }

    /// Reads an INT32 cell.
    pub fn get_i32(&self, name: &str) -> StoreResult<i32> {
        self.typed(name, "int32", |v| match v {
            NativeValue::Int32(i) => Some(*i),
            _ => None,
        })
    }

    /// Reads an INT64 cell.
    pub fn get_i64(&self, name: &str) -> StoreResult<i64> {
        self.typed(name, "int64", |v| match v {
            NativeValue::Int64(i) => Some(*i),
            _ => None,
        })
    }

    /// Reads a FLOAT cell.
    pub fn get_f32(&self, name: &str) -> StoreResult<f32> {
        self.typed(name, "float", |v| match v {
            NativeValue::Float(f) => Some(*f),
            _ => None,
        })
    }

    /// Reads a DOUBLE cell.
    pub fn get_f64(&self, name: &str) -> StoreResult<f64> {
        self.typed(name, "double", |v| match v {
            NativeValue::Double(f) => Some(*f),
            _ => None,
        })
    }

    /// Reads a STRING or VARCHAR cell.
    pub fn get_string(&self, name: &str) -> StoreResult<&str> {
        self.typed(name, "string", |v| match v {
            NativeValue::String(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Reads a BINARY cell as a view of the scan batch buffer.
    ///
    /// The view keeps the whole batch buffer alive; use
    /// [`get_binary_copy`](Self::get_binary_copy) to detach from it.
    pub fn get_binary(&self, name: &str) -> StoreResult<Bytes> {
        self.typed(name, "binary", |v| match v {
            NativeValue::Binary(b) => Some(b.clone()),
            _ => None,
        })
    }

    /// Reads a BINARY cell into a freshly allocated buffer.
    pub fn get_binary_copy(&self, name: &str) -> StoreResult<Vec<u8>> {
        self.typed(name, "binary", |v| match v {
            NativeValue::Binary(b) => Some(b.to_vec()),
            _ => None,
        })
    }

    /// Reads a UNIXTIME_MICROS cell.
    pub fn get_timestamp_micros(&self, name: &str) -> StoreResult<i64> {
        self.typed(name, "unixtime_micros", |v| match v {
            NativeValue::UnixtimeMicros(t) => Some(*t),
            _ => None,
        })
    }

    /// Reads a DECIMAL cell as its unscaled value.
    pub fn get_decimal(&self, name: &str) -> StoreResult<i128> {
        self.typed(name, "decimal", |v| match v {
            NativeValue::Decimal(d) => Some(*d),
            _ => None,
        })
    }

    /// Reads a DATE cell.
    pub fn get_date(&self, name: &str) -> StoreResult<i32> {
        self.typed(name, "date", |v| match v {
            NativeValue::Date(d) => Some(*d),
            _ => None,
        })
    }
}

/// One page of scan results.
#[derive(Debug, Clone, Default)]
pub struct RowResultBatch {
    rows: Vec<RowResult>,
}

impl RowResultBatch {
    /// Creates a batch.
    pub fn new(rows: Vec<RowResult>) -> Self {
        Self { rows }
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the rows.
    pub fn iter(&self) -> impl Iterator<Item = &RowResult> {
        self.rows.iter()
    }
}

impl IntoIterator for RowResultBatch {
    type Item = RowResult;
    type IntoIter = std::vec::IntoIter<RowResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
