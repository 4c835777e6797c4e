use std::sync::{Arc, Once};

use async_trait::async_trait;
use colbridge_client::memory::{MemoryClient, MemoryConnection, MemoryStore, SessionOptions};
use colbridge_client::{
    ColumnSchema, ConnectionProvider, NativeSchema, NativeType, OperationKind, Table,
};
use colbridge_common::OutputConfig;
use colbridge_core::{BridgeResult, BulkWriteOptions, BulkWriter, Dataset, StoreOutput};
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

/// Name of the table created by [`Harness::orders`].
pub const ORDERS_TABLE: &str = "orders";

static TRACING: Once = Once::new();

/// Installs a test subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `warn`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Native schema `(id INT64 key, name STRING, amount DECIMAL(10, 2))`.
pub fn orders_schema() -> NativeSchema {
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
    .expect("valid schema")
}

/// A memory store with one table and a connection over it.
pub struct Harness {
    /// The backing store.
    pub store: Arc<MemoryStore>,
    /// The connection handed to outputs.
    pub connection: Arc<MemoryConnection>,
    /// The table.
    pub table: Table,
}

impl Harness {
    /// Creates a harness around the orders table.
    pub fn orders() -> Self {
        Self::with_table(ORDERS_TABLE, orders_schema(), MemoryClient::new, SessionOptions::default())
    }

    /// Creates a harness with a custom table, client and session options.
    pub fn with_table(
        name: &str,
        schema: NativeSchema,
        client: impl FnOnce(Arc<MemoryStore>) -> MemoryClient,
        options: SessionOptions,
    ) -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let table = store.create_table(name, schema).expect("table created");
        let connection = Arc::new(MemoryConnection::with_session_options(
            client(Arc::clone(&store)),
            options,
        ));
        Self {
            store,
            connection,
            table,
        }
    }

    /// Default configuration for this harness's table.
    pub fn config(&self) -> OutputConfig {
        OutputConfig::new("memory:7051", self.table.name())
    }

    /// Creates an output for `config`.
    pub fn output(&self, config: OutputConfig) -> StoreOutput {
        let connection: Arc<dyn ConnectionProvider> = self.connection.clone();
        StoreOutput::new(config, connection).expect("valid output config")
    }
}

/// One call recorded by [`RecordingBulkWriter`].
#[derive(Debug, Clone)]
pub struct BulkCall {
    /// Operation kind written.
    pub kind: OperationKind,
    /// Field names of the dataset received.
    pub fields: Vec<String>,
    /// Number of rows received.
    pub rows: usize,
    /// Target table.
    pub table: String,
    /// Options received.
    pub options: BulkWriteOptions,
}

/// Bulk writer that records its calls and writes nothing.
#[derive(Debug, Default)]
pub struct RecordingBulkWriter {
    calls: Mutex<Vec<BulkCall>>,
}

impl RecordingBulkWriter {
    /// Returns the recorded calls.
    pub fn calls(&self) -> Vec<BulkCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl BulkWriter for RecordingBulkWriter {
    async fn write(
        &self,
        kind: OperationKind,
        dataset: Dataset,
        table_name: &str,
        options: BulkWriteOptions,
    ) -> BridgeResult<()> {
        self.calls.lock().push(BulkCall {
            kind,
            fields: dataset.schema().field_names().map(str::to_string).collect(),
            rows: dataset.len(),
            table: table_name.to_string(),
            options,
        });
        Ok(())
    }
}
