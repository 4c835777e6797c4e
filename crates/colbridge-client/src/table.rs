//! Table handles.

use std::sync::Arc;

use crate::operation::{Operation, OperationKind};
use crate::schema::NativeSchema;

/// An open table: its identity and schema.
///
/// The schema is fixed for the lifetime of the handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    id: String,
    name: String,
    schema: Arc<NativeSchema>,
}

impl Table {
    /// Creates a table handle.
    pub fn new(id: impl Into<String>, name: impl Into<String>, schema: Arc<NativeSchema>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schema,
        }
    }

    /// Returns the table id assigned by the store.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the table schema.
    pub fn schema(&self) -> &Arc<NativeSchema> {
        &self.schema
    }

    /// Creates an operation of the given kind against this table.
    pub fn new_operation(&self, kind: OperationKind) -> Operation {
        Operation::new(kind, self.name.clone(), Arc::clone(&self.schema))
    }

    /// Creates an insert.
    pub fn new_insert(&self) -> Operation {
        self.new_operation(OperationKind::Insert)
    }

    /// Creates an update.
    pub fn new_update(&self) -> Operation {
        self.new_operation(OperationKind::Update)
    }

    /// Creates a delete.
    pub fn new_delete(&self) -> Operation {
        self.new_operation(OperationKind::Delete)
    }

    /// Creates an upsert.
    pub fn new_upsert(&self) -> Operation {
        self.new_operation(OperationKind::Upsert)
    }
}
