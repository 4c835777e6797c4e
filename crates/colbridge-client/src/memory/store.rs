//! In-memory tables.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::operation::{Operation, OperationKind, Status, StatusCode};
use crate::row::RowResult;
use crate::scan::ScannerBuilder;
use crate::schema::NativeSchema;
use crate::table::Table;
use crate::value::NativeValue;

use super::key::encode_key;

pub(crate) type Cells = Vec<Option<NativeValue>>;

struct MemoryTable {
    table: Table,
    rows: RwLock<BTreeMap<Vec<u8>, Cells>>,
}

/// A set of tables held in memory.
///
/// Operations are applied one at a time with the same per-row outcomes a
/// remote store reports: duplicate inserts are `AlreadyPresent`, updates and
/// deletes of absent keys are `NotFound`, malformed rows are
/// `InvalidArgument`.
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Arc<MemoryTable>>>,
    next_table_id: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            next_table_id: AtomicU64::new(1),
        }
    }

    /// Creates a table.
    pub fn create_table(&self, name: &str, schema: NativeSchema) -> StoreResult<Table> {
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(StoreError::TableExists(name.to_string()));
        }

        let id = format!("{:032x}", self.next_table_id.fetch_add(1, Ordering::Relaxed));
        let table = Table::new(id, name, Arc::new(schema));
        debug!(table = name, id = table.id(), "created memory table");
        tables.insert(
            name.to_string(),
            Arc::new(MemoryTable {
                table: table.clone(),
                rows: RwLock::new(BTreeMap::new()),
            }),
        );
        Ok(table)
    }

    /// Opens a table by name.
    pub fn open_table(&self, name: &str) -> StoreResult<Table> {
        Ok(self.lookup(name)?.table.clone())
    }

    fn lookup(&self, name: &str) -> StoreResult<Arc<MemoryTable>> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
    }

    /// Applies one operation.
    pub fn apply(&self, operation: &Operation) -> Result<(), Status> {
        let table = self
            .lookup(operation.table())
            .map_err(|e| Status::new(StatusCode::NotFound, e.to_string()))?;

        let row = operation.row();
        if let Some(name) = row.unresolved_columns().first() {
            return Err(Status::new(
                StatusCode::InvalidArgument,
                format!("unknown column: {}", name),
            ));
        }

        let schema = table.table.schema();
        let key = encode_key(schema, row.cells()).map_err(|column| {
            Status::new(
                StatusCode::InvalidArgument,
                format!("missing key column: {}", column),
            )
        })?;

        let mut rows = table.rows.write();
        match operation.kind() {
            OperationKind::Insert => {
                if rows.contains_key(&key) {
                    return Err(Status::new(StatusCode::AlreadyPresent, "key already present"));
                }
                check_not_null(schema, row.cells())?;
                rows.insert(key, row.cells().to_vec());
            }
            OperationKind::Update => {
                let existing = rows
                    .get_mut(&key)
                    .ok_or_else(|| Status::new(StatusCode::NotFound, "key not found"))?;
                merge(existing, row.cells());
            }
            OperationKind::Upsert => match rows.get_mut(&key) {
                Some(existing) => merge(existing, row.cells()),
                None => {
                    check_not_null(schema, row.cells())?;
                    rows.insert(key, row.cells().to_vec());
                }
            },
            OperationKind::Delete => {
                if rows.remove(&key).is_none() {
                    return Err(Status::new(StatusCode::NotFound, "key not found"));
                }
            }
        }
        Ok(())
    }

    /// Returns the rows matching a scan, in key order.
    pub fn scan(&self, builder: &ScannerBuilder) -> StoreResult<Vec<RowResult>> {
        let (schema, rows) = self.scan_cells(builder)?;
        Ok(rows
            .into_iter()
            .map(|cells| RowResult::new(Arc::clone(&schema), cells))
            .collect())
    }

    pub(crate) fn scan_cells(
        &self,
        builder: &ScannerBuilder,
    ) -> StoreResult<(Arc<NativeSchema>, Vec<Cells>)> {
        let table = self.lookup(builder.table().name())?;
        let schema = Arc::clone(table.table.schema());

        let mut columns = Vec::with_capacity(builder.predicates().len());
        for predicate in builder.predicates() {
            let index = schema
                .column_index(predicate.column().name())
                .ok_or_else(|| StoreError::ColumnNotFound(predicate.column().name().to_string()))?;
            columns.push((index, predicate));
        }

        let rows = table.rows.read();
        let matched = rows
            .values()
            .filter(|cells| {
                columns
                    .iter()
                    .all(|(index, predicate)| predicate.evaluate(cells[*index].as_ref()))
            })
            .cloned()
            .collect();
        Ok((schema, matched))
    }

    /// Returns every row of a table, in key order.
    pub fn rows(&self, name: &str) -> StoreResult<Vec<RowResult>> {
        let table = self.lookup(name)?;
        let schema = table.table.schema();
        let rows = table.rows.read();
        Ok(rows
            .values()
            .map(|cells| RowResult::new(Arc::clone(schema), cells.clone()))
            .collect())
    }

    /// Returns the number of rows in a table.
    pub fn row_count(&self, name: &str) -> StoreResult<usize> {
        Ok(self.lookup(name)?.rows.read().len())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_not_null(schema: &NativeSchema, cells: &[Option<NativeValue>]) -> Result<(), Status> {
    for (column, cell) in schema.columns().iter().zip(cells) {
        if cell.is_none() && !column.is_nullable() {
            return Err(Status::new(
                StatusCode::InvalidArgument,
                format!("column '{}' is not nullable", column.name()),
            ));
        }
    }
    Ok(())
}

fn merge(existing: &mut Cells, cells: &[Option<NativeValue>]) {
    for (slot, cell) in existing.iter_mut().zip(cells) {
        if let Some(value) = cell {
            *slot = Some(value.clone());
        }
    }
}
