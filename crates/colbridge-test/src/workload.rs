use std::sync::Arc;

use colbridge_common::{DataType, Decimal, Field, MutationKind, Row, RowSchema, Value, MUTATION_KIND_FIELD};
use colbridge_core::Dataset;

/// Generic type of the orders `amount` column.
pub const AMOUNT_TYPE: DataType = DataType::Decimal {
    precision: 10,
    scale: 2,
};

/// A planned orders row. `None` fields are omitted.
pub fn planned_order(kind: MutationKind, id: i64, name: Option<&str>, amount: Option<&str>) -> Row {
    let mut builder = Row::builder()
        .field(MUTATION_KIND_FIELD, DataType::String, kind.as_str())
        .field("id", DataType::Int64, id);
    if let Some(name) = name {
        builder = builder.field("name", DataType::String, name);
    }
    if let Some(amount) = amount {
        builder = builder.field("amount", AMOUNT_TYPE, amount_value(amount));
    }
    builder.build()
}

/// Parses `literal` as a `DECIMAL(10, 2)` amount.
pub fn amount_value(literal: &str) -> Decimal {
    literal
        .parse::<Decimal>()
        .ok()
        .and_then(|d| d.rescale(10, 2))
        .expect("amount fits DECIMAL(10, 2)")
}

/// `count` upserts with ids `0..count`.
pub fn upserts(count: i64) -> Vec<Row> {
    (0..count)
        .map(|id| {
            let name = format!("order-{}", id);
            let amount = format!("{}.{:02}", id, id % 100);
            planned_order(MutationKind::Upsert, id, Some(name.as_str()), Some(amount.as_str()))
        })
        .collect()
}

/// Key filter rows for the given ids.
pub fn id_filters(ids: impl IntoIterator<Item = i64>) -> Vec<Row> {
    ids.into_iter()
        .map(|id| Row::builder().field("id", DataType::Int64, id).build())
        .collect()
}

/// An orders dataset with an extra `channel` field the table does not have.
pub fn orders_dataset(ids: impl IntoIterator<Item = i64>) -> Dataset {
    let schema = Arc::new(RowSchema::new(vec![
        Field::nullable("id", DataType::Int64),
        Field::nullable("channel", DataType::String),
        Field::nullable("name", DataType::String),
    ]));
    let rows = ids
        .into_iter()
        .map(|id| {
            Row::with_schema(
                Arc::clone(&schema),
                vec![Value::Int64(id), Value::from("web"), Value::from(format!("bulk-{}", id))],
            )
        })
        .collect();
    Dataset::new(schema, rows)
}
