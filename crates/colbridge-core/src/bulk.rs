//! Whole-dataset mutations.
//!
//! Bulk mutations arrive as one dataset per mutation kind. The output
//! prepares them and hands each to a [`BulkWriter`]; [`SessionBulkWriter`]
//! writes them through a store session.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use colbridge_client::{ConnectionProvider, Operation, OperationKind, Table};
use colbridge_common::{Field, Row, RowSchema, Value};
use tracing::debug;

use crate::applier::BatchApplier;
use crate::error::{BridgeError, BridgeResult};
use crate::type_bridge::{semantic_to_native, WriteContext};

/// A set of rows sharing one schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: Arc<RowSchema>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Creates a dataset. Rows are read positionally against `schema`.
    pub fn new(schema: Arc<RowSchema>, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    /// Returns the schema.
    pub fn schema(&self) -> &Arc<RowSchema> {
        &self.schema
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the dataset restricted to the fields named in `keep`.
    pub fn retain_fields(&self, keep: &HashSet<&str>) -> Dataset {
        let kept: Vec<usize> = self
            .schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| keep.contains(field.name.as_str()))
            .map(|(index, _)| index)
            .collect();
        if kept.len() == self.schema.len() {
            return self.clone();
        }

        let fields: Vec<Field> = kept.iter().map(|&i| self.schema.fields()[i].clone()).collect();
        let schema = Arc::new(RowSchema::new(fields));
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let values = kept
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
                    .collect();
                Row::with_schema(Arc::clone(&schema), values)
            })
            .collect();
        Dataset::new(schema, rows)
    }
}

/// Options passed to bulk writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkWriteOptions {
    /// Rows whose key already exists are skipped instead of failing the write.
    pub ignore_duplicate_rows: bool,
}

impl BulkWriteOptions {
    /// Sets `ignore_duplicate_rows`.
    pub fn ignore_duplicate_rows(mut self, ignore: bool) -> Self {
        self.ignore_duplicate_rows = ignore;
        self
    }
}

/// Writes a whole dataset as one kind of mutation.
#[async_trait]
pub trait BulkWriter: Send + Sync {
    /// Writes every row of `dataset` to `table_name`.
    async fn write(
        &self,
        kind: OperationKind,
        dataset: Dataset,
        table_name: &str,
        options: BulkWriteOptions,
    ) -> BridgeResult<()>;
}

/// Bulk writer that applies datasets through a store session.
pub struct SessionBulkWriter {
    connection: Arc<dyn ConnectionProvider>,
    applier: BatchApplier,
}

impl SessionBulkWriter {
    /// Creates a writer over a connection.
    pub fn new(connection: Arc<dyn ConnectionProvider>, applier: BatchApplier) -> Self {
        Self {
            connection,
            applier,
        }
    }

    fn operations(kind: OperationKind, dataset: &Dataset, table: &Table) -> BridgeResult<Vec<Operation>> {
        let mut columns = Vec::with_capacity(dataset.schema().len());
        for field in dataset.schema().fields() {
            let column = table
                .schema()
                .column(&field.name)
                .ok_or_else(|| BridgeError::ColumnNotFound {
                    column: field.name.clone(),
                    table: table.name().to_string(),
                })?;
            columns.push(column);
        }

        let mut operations = Vec::with_capacity(dataset.len());
        for row in dataset.rows() {
            let mut operation = table.new_operation(kind);
            let context = WriteContext::new(table.name(), row);
            for (column, value) in columns.iter().zip(row.values()) {
                semantic_to_native(value, column, operation.row_mut(), &context)?;
            }
            operations.push(operation);
        }
        Ok(operations)
    }
}

#[async_trait]
impl BulkWriter for SessionBulkWriter {
    async fn write(
        &self,
        kind: OperationKind,
        dataset: Dataset,
        table_name: &str,
        options: BulkWriteOptions,
    ) -> BridgeResult<()> {
        let table = self.connection.table(table_name).await?;
        let operations = Self::operations(kind, &dataset, &table)?;
        debug!(table = table_name, %kind, rows = operations.len(), "writing dataset");

        let session = self.connection.session().await?;
        self.applier
            .ignoring_duplicate_rows(options.ignore_duplicate_rows)
            .apply(operations, session.as_ref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colbridge_common::DataType;

    fn dataset() -> Dataset {
        let schema = Arc::new(RowSchema::new(vec![
            Field::nullable("id", DataType::Int64),
            Field::nullable("extra", DataType::String),
            Field::nullable("name", DataType::String),
        ]));
        let rows = vec![
            Row::with_schema(
                Arc::clone(&schema),
                vec![Value::Int64(1), Value::from("x"), Value::from("a")],
            ),
            Row::with_schema(
                Arc::clone(&schema),
                vec![Value::Int64(2), Value::Null, Value::from("b")],
            ),
        ];
        Dataset::new(schema, rows)
    }

    #[test]
    fn test_retain_fields() {
        let keep: HashSet<&str> = ["id", "name"].into_iter().collect();
        let trimmed = dataset().retain_fields(&keep);

        assert_eq!(trimmed.schema().field_names().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(trimmed.rows()[1].values(), &[Value::Int64(2), Value::from("b")]);
        assert_eq!(trimmed.rows()[0].get_by_name("name"), Some(&Value::from("a")));
    }

    #[test]
    fn test_retain_all_fields_is_identity() {
        let keep: HashSet<&str> = ["id", "extra", "name"].into_iter().collect();
        assert_eq!(dataset().retain_fields(&keep), dataset());
    }
}
