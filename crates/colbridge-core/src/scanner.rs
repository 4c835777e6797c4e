//! Existence lookups: which of these filter rows already exist?
//!
//! All filter rows of one lookup are folded into a single scan with one
//! in-list predicate per filter field, so N filter rows on K key columns
//! cost K predicates and one scanner rather than N point lookups.

use std::sync::Arc;
use std::time::Instant;

use colbridge_client::{InListPredicate, ScannerBuilder, StoreClient, Table, DEFAULT_BATCH_SIZE_ROWS};
use colbridge_common::Row;
use tracing::debug;

use crate::accumulators::ScanMetrics;
use crate::error::{BridgeError, BridgeResult};
use crate::schema_cache::SchemaCache;
use crate::type_bridge::{result_to_row, value_to_predicate_value, WriteContext};

/// Turns filter rows into scans and scan results into generic rows.
#[derive(Debug)]
pub struct ExistenceScanner {
    cache: Arc<SchemaCache>,
    metrics: Option<ScanMetrics>,
    batch_size_rows: usize,
}

impl ExistenceScanner {
    /// Creates a scanner decoding results through `cache`.
    pub fn new(cache: Arc<SchemaCache>) -> Self {
        Self {
            cache,
            metrics: None,
            batch_size_rows: DEFAULT_BATCH_SIZE_ROWS,
        }
    }

    /// Sets the number of rows fetched per scan batch.
    pub fn with_batch_size_rows(mut self, rows: usize) -> Self {
        self.batch_size_rows = rows;
        self
    }

    /// Attaches scan metrics.
    pub fn set_metrics(&mut self, metrics: ScanMetrics) {
        self.metrics = Some(metrics);
    }

    /// Returns the attached metrics.
    pub fn metrics(&self) -> Option<&ScanMetrics> {
        self.metrics.as_ref()
    }

    /// Returns the schema cache.
    pub fn schema_cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// Describes the scan for a non-empty set of filter rows.
    ///
    /// The fields of the first filter row's schema select the columns to
    /// filter on. NULL filter values are left out of the in-lists.
    pub fn build_scan_request(
        &self,
        client: &dyn StoreClient,
        filters: &[Row],
        table: &Table,
    ) -> BridgeResult<ScannerBuilder> {
        let first = filters.first().ok_or(BridgeError::MissingFilter)?;
        let schema = first
            .schema()
            .ok_or_else(|| BridgeError::missing_schema("existence filter"))?;

        let mut builder = client
            .new_scanner_builder(table)
            .batch_size_rows(self.batch_size_rows);

        for name in schema.field_names() {
            let column = table
                .schema()
                .column(name)
                .ok_or_else(|| BridgeError::ColumnNotFound {
                    column: name.to_string(),
                    table: table.name().to_string(),
                })?;

            let mut values = Vec::with_capacity(filters.len());
            for filter in filters {
                let context = WriteContext::new(table.name(), filter);
                let value = filter.field_value(name)?;
                if let Some(native) = value_to_predicate_value(value, column, &context)? {
                    values.push(native);
                }
            }

            builder = builder.add_predicate(InListPredicate::new(column.clone(), values)?);
        }

        Ok(builder)
    }

    /// Returns the existing rows matching any of the filter rows.
    ///
    /// Rows come back in scan order and carry the table's generic schema.
    /// An empty filter list returns no rows without scanning.
    pub async fn scan_for_filters(
        &self,
        client: &dyn StoreClient,
        filters: &[Row],
        table: &Table,
    ) -> BridgeResult<Vec<Row>> {
        if filters.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_scan(filters.len());
        }
        let builder = self.build_scan_request(client, filters, table)?;
        debug!(
            table = table.name(),
            filters = filters.len(),
            predicates = builder.predicates().len(),
            "scanning for existing rows"
        );

        let schema = self.cache.get_schema(table)?;
        let start = Instant::now();

        let mut scanner = client.open_scanner(builder).await?;
        let mut existing = Vec::new();
        while scanner.has_more_rows() {
            for result in scanner.next_rows().await? {
                existing.push(result_to_row(&result, Arc::clone(&schema))?);
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_seconds(start.elapsed().as_secs_f64());
        }
        Ok(existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use colbridge_client::memory::{MemoryClient, MemoryStore};
    use colbridge_client::{ColumnSchema, NativeSchema, NativeType, NativeValue};
    use colbridge_common::{DataType, Value};

    use crate::accumulators::Accumulators;

    fn setup() -> (MemoryClient, Table) {
        let store = Arc::new(MemoryStore::new());
        let table = store
            .create_table(
                "orders",
                NativeSchema::new(vec![
                    ColumnSchema::key("id", NativeType::Int64),
                    ColumnSchema::new("name", NativeType::String),
                ])
                .unwrap(),
            )
            .unwrap();
        for (id, name) in [(1, "a"), (2, "b"), (3, "c"), (4, "d")] {
            let mut op = table.new_insert();
            op.row_mut().add_i64("id", id).unwrap();
            op.row_mut().add_string("name", name).unwrap();
            store.apply(&op).unwrap();
        }
        (MemoryClient::new(store), table)
    }

    fn filter(id: impl Into<Value>) -> Row {
        Row::builder().field("id", DataType::Int64, id).build()
    }

    #[test]
    fn test_one_predicate_per_field() {
        let (client, table) = setup();
        let scanner = ExistenceScanner::new(Arc::new(SchemaCache::new()));

        let filters = vec![filter(1i64), filter(2i64), filter(3i64)];
        let request = scanner.build_scan_request(&client, &filters, &table).unwrap();

        assert_eq!(request.predicates().len(), 1);
        let predicate = &request.predicates()[0];
        assert_eq!(predicate.column().name(), "id");
        assert_eq!(
            predicate.values(),
            &[NativeValue::Int64(1), NativeValue::Int64(2), NativeValue::Int64(3)]
        );
    }

    #[test]
    fn test_preconditions() {
        let (client, table) = setup();
        let scanner = ExistenceScanner::new(Arc::new(SchemaCache::new()));

        assert!(matches!(
            scanner.build_scan_request(&client, &[], &table),
            Err(BridgeError::MissingFilter)
        ));

        let no_schema = vec![Row::new(vec![Value::Int64(1)])];
        assert!(matches!(
            scanner.build_scan_request(&client, &no_schema, &table),
            Err(BridgeError::MissingSchema { .. })
        ));

        let unknown = vec![Row::builder().field("sku", DataType::String, "x").build()];
        assert!(matches!(
            scanner.build_scan_request(&client, &unknown, &table),
            Err(BridgeError::ColumnNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_scan_returns_existing_rows() {
        let (client, table) = setup();
        let cache = Arc::new(SchemaCache::new());
        let mut scanner = ExistenceScanner::new(Arc::clone(&cache)).with_batch_size_rows(1);
        let accumulators = Accumulators::from_requests(&ScanMetrics::requests());
        scanner.set_metrics(ScanMetrics::from_accumulators(&accumulators).unwrap());

        let filters = vec![filter(4i64), filter(2i64), filter(9i64), filter(Value::Null)];
        let rows = scanner.scan_for_filters(&client, &filters, &table).await.unwrap();

        let ids: Vec<_> = rows.iter().map(|r| r.get_by_name("id").cloned()).collect();
        assert_eq!(ids, vec![Some(Value::Int64(2)), Some(Value::Int64(4))]);
        assert_eq!(rows[0].get_by_name("name"), Some(&Value::from("b")));
        assert!(Arc::ptr_eq(rows[0].schema().unwrap(), rows[1].schema().unwrap()));

        let metrics = scanner.metrics().unwrap();
        assert_eq!(metrics.scanners(), 1);
        assert_eq!(metrics.filters_scanned(), 4);
        assert!(metrics.seconds_scanning() >= 0.0);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_still_counted() {
        let (client, table) = setup();
        let mut scanner = ExistenceScanner::new(Arc::new(SchemaCache::new()));
        let accumulators = Accumulators::from_requests(&ScanMetrics::requests());
        scanner.set_metrics(ScanMetrics::from_accumulators(&accumulators).unwrap());

        let unknown = vec![Row::builder().field("sku", DataType::String, "x").build()];
        let err = scanner.scan_for_filters(&client, &unknown, &table).await.unwrap_err();
        assert!(matches!(err, BridgeError::ColumnNotFound { .. }));

        let metrics = scanner.metrics().unwrap();
        assert_eq!(metrics.scanners(), 1);
        assert_eq!(metrics.filters_scanned(), 1);
        assert!(client.scan_requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_filters_skip_scan() {
        let (client, table) = setup();
        let scanner = ExistenceScanner::new(Arc::new(SchemaCache::new()));
        assert!(scanner.scan_for_filters(&client, &[], &table).await.unwrap().is_empty());
        assert!(client.scan_requests().is_empty());
    }

    #[tokio::test]
    async fn test_all_null_filters_match_nothing() {
        let (client, table) = setup();
        let scanner = ExistenceScanner::new(Arc::new(SchemaCache::new()));
        let rows = scanner
            .scan_for_filters(&client, &[filter(Value::Null)], &table)
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(client.scan_requests().len(), 1);
    }
}
