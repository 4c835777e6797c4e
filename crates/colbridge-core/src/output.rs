//! The pipeline-facing output for one store table.

use std::collections::HashSet;
use std::sync::Arc;

use colbridge_client::ConnectionProvider;
use colbridge_common::{MutationKind, OutputConfig, Row, OUTPUT_ALIAS};
use tracing::{debug, info, warn};

use crate::accumulators::{AccumulatorRequest, Accumulators, ScanMetrics};
use crate::applier::BatchApplier;
use crate::bulk::{BulkWriteOptions, BulkWriter, Dataset, SessionBulkWriter};
use crate::error::{BridgeError, BridgeResult};
use crate::mutation::{operation_kind, MutationBuilder, SUPPORTED_MUTATION_KINDS};
use crate::scanner::ExistenceScanner;
use crate::schema_cache::SchemaCache;
use crate::token::{StoreTokenProvider, TokenProvider};

/// Writes planned mutations to, and looks up existing rows in, the table
/// named by its configuration.
///
/// Connections are borrowed from the [`ConnectionProvider`] for the
/// duration of each call. The output itself only owns the schema cache and
/// the attached metrics.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use colbridge_client::memory::{MemoryClient, MemoryConnection, MemoryStore};
/// use colbridge_common::{DataType, OutputConfig, Row, MUTATION_KIND_FIELD};
/// use colbridge_core::StoreOutput;
///
/// # async fn example() -> colbridge_core::BridgeResult<()> {
/// let connection = Arc::new(MemoryConnection::new(MemoryClient::new(Arc::new(MemoryStore::new()))));
/// let output = StoreOutput::new(OutputConfig::new("localhost:7051", "orders"), connection)?;
///
/// let planned = Row::builder()
///     .field(MUTATION_KIND_FIELD, DataType::String, "UPSERT")
///     .field("id", DataType::Int64, 1i64)
///     .build();
/// output.apply_random_mutations(&[planned]).await?;
/// # Ok(())
/// # }
/// ```
pub struct StoreOutput {
    config: OutputConfig,
    connection: Arc<dyn ConnectionProvider>,
    builder: MutationBuilder,
    applier: BatchApplier,
    scanner: ExistenceScanner,
    bulk_writer: Arc<dyn BulkWriter>,
}

impl StoreOutput {
    /// Creates an output after validating its configuration.
    pub fn new(config: OutputConfig, connection: Arc<dyn ConnectionProvider>) -> BridgeResult<Self> {
        config.validate().map_err(BridgeError::invalid_config)?;

        let mut applier = BatchApplier::new().ignoring_duplicate_rows(config.insert_ignore);
        if let Some(timeout) = config.apply_timeout {
            applier = applier.with_timeout(timeout);
        }

        debug!(
            table = %config.table_name,
            ignore_missing_columns = config.ignore_missing_columns,
            "configured store output"
        );

        Ok(Self {
            builder: MutationBuilder::new(config.ignore_missing_columns),
            scanner: ExistenceScanner::new(Arc::new(SchemaCache::new())),
            bulk_writer: Arc::new(SessionBulkWriter::new(Arc::clone(&connection), applier)),
            applier,
            connection,
            config,
        })
    }

    /// Replaces the writer used for bulk mutations.
    pub fn with_bulk_writer(mut self, writer: Arc<dyn BulkWriter>) -> Self {
        self.bulk_writer = writer;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Returns the schema cache shared by existence lookups.
    pub fn schema_cache(&self) -> &Arc<SchemaCache> {
        self.scanner.schema_cache()
    }

    /// Returns the alias the output registers under.
    pub fn alias(&self) -> &'static str {
        OUTPUT_ALIAS
    }

    /// Applies planned rows as one fail-fast batch.
    pub async fn apply_random_mutations(&self, planned: &[Row]) -> BridgeResult<()> {
        let session = self.connection.session().await?;
        let table = self.connection.table(&self.config.table_name).await?;

        let operations = self.builder.build_operations(planned, &table)?;
        self.applier.apply(operations, session.as_ref()).await
    }

    /// Returns the existing rows matching any of the filter rows.
    pub async fn get_existing_for_filters(&self, filters: &[Row]) -> BridgeResult<Vec<Row>> {
        if filters.is_empty() {
            return Ok(Vec::new());
        }

        let table = self.connection.table(&self.config.table_name).await?;
        let client = self.connection.client();
        self.scanner
            .scan_for_filters(client.as_ref(), filters, &table)
            .await
    }

    /// Applies one dataset per mutation kind through the bulk writer.
    ///
    /// With `ignore.missing.columns` set, dataset fields that name no table
    /// column are dropped first. Inserts honour `insert.ignore`.
    pub async fn apply_bulk_mutations(&self, planned: Vec<(MutationKind, Dataset)>) -> BridgeResult<()> {
        let table_name = self.config.table_name.as_str();

        let columns: Option<HashSet<String>> = if self.config.ignore_missing_columns {
            let table = self.connection.table(table_name).await?;
            Some(
                table
                    .schema()
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect(),
            )
        } else {
            None
        };

        let options = BulkWriteOptions::default().ignore_duplicate_rows(self.config.insert_ignore);

        for (kind, dataset) in planned {
            let operation_kind = operation_kind(kind).map_err(|_| BridgeError::UnsupportedMutationKind {
                kind: format!("{} (bulk)", kind),
            })?;

            let dataset = match &columns {
                Some(columns) => {
                    let keep = columns.iter().map(String::as_str).collect();
                    dataset.retain_fields(&keep)
                }
                None => dataset,
            };

            self.bulk_writer
                .write(operation_kind, dataset, table_name, options)
                .await?;
        }
        Ok(())
    }

    /// Mutation kinds accepted by [`apply_random_mutations`](Self::apply_random_mutations).
    pub fn supported_random_mutation_kinds(&self) -> HashSet<MutationKind> {
        SUPPORTED_MUTATION_KINDS.into_iter().collect()
    }

    /// Mutation kinds accepted by [`apply_bulk_mutations`](Self::apply_bulk_mutations).
    pub fn supported_bulk_mutation_kinds(&self) -> HashSet<MutationKind> {
        SUPPORTED_MUTATION_KINDS.into_iter().collect()
    }

    /// Returns the accumulators the output updates.
    pub fn accumulator_requests(&self) -> Vec<AccumulatorRequest> {
        info!("store output requesting accumulators");
        ScanMetrics::requests()
    }

    /// Attaches the accumulators created for [`accumulator_requests`](Self::accumulator_requests).
    pub fn receive_accumulators(&mut self, accumulators: &Accumulators) {
        match ScanMetrics::from_accumulators(accumulators) {
            Some(metrics) => {
                self.scanner.set_metrics(metrics);
                info!("store output received accumulators");
            }
            None => warn!("store output received an incomplete accumulator set, metrics disabled"),
        }
    }

    /// Returns the scan metrics, once accumulators have been received.
    pub fn scan_metrics(&self) -> Option<&ScanMetrics> {
        self.scanner.metrics()
    }

    /// Returns a token provider when the connection is secured.
    pub fn token_provider(&self) -> Option<Arc<dyn TokenProvider>> {
        if !self.config.secure {
            return None;
        }
        Some(Arc::new(StoreTokenProvider::new(
            Arc::clone(&self.connection),
            self.config.connection.clone(),
            self.config.kerberos.clone().unwrap_or_default(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colbridge_client::memory::{MemoryClient, MemoryConnection, MemoryStore};
    use colbridge_common::KerberosConfig;

    fn connection() -> Arc<dyn ConnectionProvider> {
        Arc::new(MemoryConnection::new(MemoryClient::new(Arc::new(MemoryStore::new()))))
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = StoreOutput::new(OutputConfig::new("", "orders"), connection());
        assert!(matches!(result, Err(BridgeError::InvalidConfig { .. })));
    }

    #[test]
    fn test_supported_kinds() {
        let output = StoreOutput::new(OutputConfig::new("m:7051", "orders"), connection()).unwrap();
        let kinds = output.supported_random_mutation_kinds();
        assert_eq!(kinds.len(), 4);
        assert!(!kinds.contains(&MutationKind::Overwrite));
        assert_eq!(kinds, output.supported_bulk_mutation_kinds());
        assert_eq!(output.alias(), "colstore");
    }

    #[test]
    fn test_token_provider_only_when_secure() {
        let output = StoreOutput::new(OutputConfig::new("m:7051", "orders"), connection()).unwrap();
        assert!(output.token_provider().is_none());

        let config = OutputConfig::new("m:7051", "orders")
            .secure(KerberosConfig::with_keytab("etl@EXAMPLE.COM", "/etc/etl.keytab"));
        let output = StoreOutput::new(config, connection()).unwrap();
        let provider = output.token_provider().unwrap();
        assert_eq!(provider.alias(), "colstore");
    }

    #[test]
    fn test_receive_accumulators() {
        let mut output = StoreOutput::new(OutputConfig::new("m:7051", "orders"), connection()).unwrap();
        assert!(output.scan_metrics().is_none());

        let requests = output.accumulator_requests();
        assert_eq!(requests.len(), 3);
        output.receive_accumulators(&Accumulators::from_requests(&requests));
        assert!(output.scan_metrics().is_some());
    }

    #[tokio::test]
    async fn test_empty_filters_do_not_touch_the_store() {
        let output = StoreOutput::new(OutputConfig::new("m:7051", "missing"), connection()).unwrap();
        assert!(output.get_existing_for_filters(&[]).await.unwrap().is_empty());
    }
}
