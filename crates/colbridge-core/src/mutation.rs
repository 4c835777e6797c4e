//! Planned rows to store operations.

use colbridge_client::{Operation, OperationKind, Table};
use colbridge_common::types::{mutation_kind, strip_mutation_kind};
use colbridge_common::{MutationKind, Row};

use crate::error::{BridgeError, BridgeResult};
use crate::type_bridge::{semantic_to_native, WriteContext};

/// Mutation kinds the bridge turns into store operations.
pub const SUPPORTED_MUTATION_KINDS: [MutationKind; 4] = [
    MutationKind::Insert,
    MutationKind::Update,
    MutationKind::Delete,
    MutationKind::Upsert,
];

/// Returns the store operation kind for a mutation kind.
pub fn operation_kind(kind: MutationKind) -> BridgeResult<OperationKind> {
    match kind {
        MutationKind::Insert => Ok(OperationKind::Insert),
        MutationKind::Update => Ok(OperationKind::Update),
        MutationKind::Delete => Ok(OperationKind::Delete),
        MutationKind::Upsert => Ok(OperationKind::Upsert),
        MutationKind::None | MutationKind::Overwrite => Err(BridgeError::UnsupportedMutationKind {
            kind: kind.to_string(),
        }),
    }
}

/// Builds store operations from planned rows.
///
/// Each planned row carries its mutation kind in the reserved marker field.
/// The marker is stripped and the remaining fields are written by name.
/// Fields that name no table column are either dropped (when
/// `ignore_missing_columns` is set) or passed on as unresolved columns,
/// which the store rejects when the operation is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutationBuilder {
    ignore_missing_columns: bool,
}

impl MutationBuilder {
    /// Creates a builder.
    pub fn new(ignore_missing_columns: bool) -> Self {
        Self {
            ignore_missing_columns,
        }
    }

    /// Returns true if unknown fields are dropped.
    pub fn ignores_missing_columns(&self) -> bool {
        self.ignore_missing_columns
    }

    /// Builds one operation per planned row, in input order.
    ///
    /// Fails on the first row that cannot be converted; no operations are
    /// returned in that case.
    pub fn build_operations(&self, planned: &[Row], table: &Table) -> BridgeResult<Vec<Operation>> {
        planned
            .iter()
            .map(|plan| self.build_operation(plan, table))
            .collect()
    }

    /// Builds the operation for one planned row.
    pub fn build_operation(&self, plan: &Row, table: &Table) -> BridgeResult<Operation> {
        if plan.schema().is_none() {
            return Err(BridgeError::missing_schema("planned row"));
        }
        let kind = operation_kind(mutation_kind(plan)?)?;
        let mut operation = table.new_operation(kind);

        let plan = strip_mutation_kind(plan);
        let Some(schema) = plan.schema() else {
            return Err(BridgeError::missing_schema("planned row"));
        };
        let context = WriteContext::new(table.name(), &plan);

        for (field, value) in schema.fields().iter().zip(plan.values()) {
            let Some(column) = table.schema().column(&field.name) else {
                if !self.ignore_missing_columns {
                    operation.row_mut().mark_unresolved(field.name.as_str());
                }
                continue;
            };
            semantic_to_native(value, column, operation.row_mut(), &context)?;
        }

        Ok(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use colbridge_client::{ColumnSchema, NativeSchema, NativeType, NativeValue};
    use colbridge_common::{DataType, Decimal, Value, MUTATION_KIND_FIELD};

    fn orders() -> Table {
        Table::new(
            "t-1",
            "orders",
            Arc::new(
                NativeSchema::new(vec![
                    ColumnSchema::key("id", NativeType::Int64),
                    ColumnSchema::new("name", NativeType::String),
                    ColumnSchema::new(
                        "amount",
                        NativeType::Decimal {
                            precision: 10,
                            scale: 2,
                        },
                    ),
                ])
                .unwrap(),
            ),
        )
    }

    fn planned(kind: &str, id: i64) -> colbridge_common::RowBuilder {
        Row::builder()
            .field(MUTATION_KIND_FIELD, DataType::String, kind)
            .field("id", DataType::Int64, id)
    }

    #[test]
    fn test_builds_in_order() {
        let rows = vec![
            planned("UPSERT", 1)
                .field("name", DataType::String, "a")
                .field(
                    "amount",
                    DataType::Decimal {
                        precision: 3,
                        scale: 2,
                    },
                    Decimal::new(350, 3, 2).unwrap(),
                )
                .build(),
            planned("DELETE", 2).build(),
        ];

        let operations = MutationBuilder::default()
            .build_operations(&rows, &orders())
            .unwrap();
        assert_eq!(operations.len(), 2);
        assert_eq!(operations[0].kind(), OperationKind::Upsert);
        assert_eq!(operations[0].row().get("amount"), Some(&NativeValue::Decimal(350)));
        assert_eq!(operations[1].kind(), OperationKind::Delete);
        assert_eq!(operations[1].row().set_column_names().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn test_null_fields_left_unset() {
        let row = planned("UPDATE", 1)
            .field("name", DataType::String, Value::Null)
            .build();
        let operation = MutationBuilder::default()
            .build_operation(&row, &orders())
            .unwrap();
        assert!(!operation.row().is_set("name"));
        assert!(operation.row().is_set("id"));
    }

    #[test]
    fn test_missing_columns() {
        let row = planned("INSERT", 1).field("extra", DataType::Int32, 5i32).build();

        let operation = MutationBuilder::new(true).build_operation(&row, &orders()).unwrap();
        assert!(operation.row().unresolved_columns().is_empty());
        assert_eq!(operation.row().set_column_names().collect::<Vec<_>>(), vec!["id"]);

        let operation = MutationBuilder::new(false).build_operation(&row, &orders()).unwrap();
        assert_eq!(operation.row().unresolved_columns(), &["extra".to_string()]);
    }

    #[test]
    fn test_rejects_bad_rows() {
        let builder = MutationBuilder::default();
        let table = orders();

        let no_schema = Row::new(vec![Value::from("UPSERT"), Value::Int64(1)]);
        assert!(matches!(
            builder.build_operation(&no_schema, &table),
            Err(BridgeError::MissingSchema { .. })
        ));

        let no_kind = Row::builder().field("id", DataType::Int64, 1i64).build();
        assert!(matches!(
            builder.build_operation(&no_kind, &table),
            Err(BridgeError::MissingMutationKind { .. })
        ));

        for kind in ["NONE", "OVERWRITE", "MERGE"] {
            assert!(matches!(
                builder.build_operation(&planned(kind, 1).build(), &table),
                Err(BridgeError::UnsupportedMutationKind { .. })
            ));
        }
    }

    #[test]
    fn test_type_mismatch_fails_whole_call() {
        let rows = vec![
            planned("UPSERT", 1).build(),
            planned("UPSERT", 2).field("name", DataType::Int32, 7i32).build(),
        ];
        let err = MutationBuilder::default()
            .build_operations(&rows, &orders())
            .unwrap_err();
        match err {
            BridgeError::TypeMismatch { field, actual, .. } => {
                assert_eq!(field, "name");
                assert_eq!(actual, "Int32");
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_supported_kinds() {
        for kind in SUPPORTED_MUTATION_KINDS {
            assert!(operation_kind(kind).is_ok());
        }
        assert!(operation_kind(MutationKind::Overwrite).is_err());
    }
}
