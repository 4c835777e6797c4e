//! Scan requests and scanners.

use std::fmt;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::row::RowResultBatch;
use crate::schema::ColumnSchema;
use crate::table::Table;
use crate::value::NativeValue;

/// Default number of rows per scan batch.
pub const DEFAULT_BATCH_SIZE_ROWS: usize = 1024;

/// Restricts a scan to rows whose column value is in a set.
#[derive(Debug, Clone, PartialEq)]
pub struct InListPredicate {
    column: ColumnSchema,
    values: Vec<NativeValue>,
}

impl InListPredicate {
    /// Creates a predicate, checking every value against the column type.
    pub fn new(column: ColumnSchema, values: Vec<NativeValue>) -> StoreResult<Self> {
        if let Some(bad) = values.iter().find(|v| !v.matches(column.native_type())) {
            return Err(StoreError::ColumnTypeMismatch {
                column: column.name().to_string(),
                expected: column.native_type(),
                requested: bad.type_name(),
            });
        }
        Ok(Self { column, values })
    }

    /// Returns the filtered column.
    pub fn column(&self) -> &ColumnSchema {
        &self.column
    }

    /// Returns the accepted values.
    pub fn values(&self) -> &[NativeValue] {
        &self.values
    }

    /// Returns true if a cell satisfies the predicate. NULL never does.
    pub fn evaluate(&self, cell: Option<&NativeValue>) -> bool {
        cell.map_or(false, |value| self.values.contains(value))
    }
}

impl fmt::Display for InListPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` IN (", self.column.name())?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value.display_for(self.column.native_type()))?;
        }
        write!(f, ")")
    }
}

/// Describes a scan: table, predicates and paging.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerBuilder {
    table: Table,
    predicates: Vec<InListPredicate>,
    batch_size_rows: usize,
}

impl ScannerBuilder {
    /// Creates an unfiltered scan of the table.
    pub fn new(table: Table) -> Self {
        Self {
            table,
            predicates: Vec::new(),
            batch_size_rows: DEFAULT_BATCH_SIZE_ROWS,
        }
    }

    /// Adds a predicate. All predicates must hold for a row to be returned.
    pub fn add_predicate(mut self, predicate: InListPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Sets the number of rows per batch.
    pub fn batch_size_rows(mut self, rows: usize) -> Self {
        self.batch_size_rows = rows.max(1);
        self
    }

    /// Returns the scanned table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Returns the predicates.
    pub fn predicates(&self) -> &[InListPredicate] {
        &self.predicates
    }

    /// Returns the number of rows per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size_rows
    }
}

/// An open scan, read batch by batch.
#[async_trait]
pub trait Scanner: Send {
    /// Returns true if another batch may be read.
    fn has_more_rows(&self) -> bool;

    /// Reads the next batch.
    async fn next_rows(&mut self) -> StoreResult<RowResultBatch>;
}
