//! Background-flushing write session over a [`MemoryStore`].
//!
//! `apply` only enqueues. A flusher task drains the queue in apply order,
//! applies each operation to the store, and records failures as row errors.
//! The number of outstanding operations is published on a watch channel so
//! `flush` can wait for it to reach zero without polling.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::trace;

use crate::client::Session;
use crate::error::{StoreError, StoreResult};
use crate::operation::{Operation, PendingErrors, RowError};

use super::store::MemoryStore;

/// Default number of row errors a session keeps before dropping new ones.
pub const DEFAULT_ERROR_BUFFER_CAPACITY: usize = 1000;

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Row errors kept before the buffer overflows.
    pub error_buffer_capacity: usize,
    /// Artificial latency added before each operation is applied.
    pub apply_delay: Option<Duration>,
    /// Identity reported as the tablet server on row errors.
    pub ts_uuid: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            error_buffer_capacity: DEFAULT_ERROR_BUFFER_CAPACITY,
            apply_delay: None,
            ts_uuid: "memory-ts-0".to_string(),
        }
    }
}

impl SessionOptions {
    /// Sets the error buffer capacity.
    pub fn with_error_buffer_capacity(mut self, capacity: usize) -> Self {
        self.error_buffer_capacity = capacity;
        self
    }

    /// Sets the per-operation apply delay.
    pub fn with_apply_delay(mut self, delay: Duration) -> Self {
        self.apply_delay = Some(delay);
        self
    }

    /// Sets the reported tablet server identity.
    pub fn with_ts_uuid(mut self, ts_uuid: impl Into<String>) -> Self {
        self.ts_uuid = ts_uuid.into();
        self
    }
}

#[derive(Default)]
struct ErrorBuffer {
    errors: Vec<RowError>,
    overflowed: bool,
}

struct Shared {
    store: Arc<MemoryStore>,
    options: SessionOptions,
    /// Outstanding operation count.
    pending: watch::Sender<usize>,
    errors: Mutex<ErrorBuffer>,
}

impl Shared {
    fn record(&self, error: RowError) {
        let mut buffer = self.errors.lock();
        if buffer.errors.len() < self.options.error_buffer_capacity {
            buffer.errors.push(error);
        } else {
            buffer.overflowed = true;
        }
    }
}

/// A write session backed by a memory store.
///
/// Must be created inside a tokio runtime; the flusher task lives as long
/// as the session.
pub struct MemorySession {
    shared: Arc<Shared>,
    queue: mpsc::UnboundedSender<Operation>,
}

impl MemorySession {
    /// Creates a session with default options.
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self::with_options(store, SessionOptions::default())
    }

    /// Creates a session and starts its flusher task.
    pub fn with_options(store: Arc<MemoryStore>, options: SessionOptions) -> Self {
        let (pending, _) = watch::channel(0usize);
        let shared = Arc::new(Shared {
            store,
            options,
            pending,
            errors: Mutex::new(ErrorBuffer::default()),
        });
        let (queue, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_flusher(Arc::clone(&shared), receiver));
        Self { shared, queue }
    }
}

async fn run_flusher(shared: Arc<Shared>, mut receiver: mpsc::UnboundedReceiver<Operation>) {
    while let Some(operation) = receiver.recv().await {
        if let Some(delay) = shared.options.apply_delay {
            tokio::time::sleep(delay).await;
        }
        if let Err(status) = shared.store.apply(&operation) {
            trace!(%status, %operation, "operation failed");
            shared.record(RowError::new(status, operation, shared.options.ts_uuid.clone()));
        }
        shared.pending.send_modify(|n| *n = n.saturating_sub(1));
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn apply(&self, operation: Operation) -> StoreResult<()> {
        self.shared.pending.send_modify(|n| *n += 1);
        self.queue.send(operation).map_err(|_| {
            self.shared.pending.send_modify(|n| *n = n.saturating_sub(1));
            StoreError::SessionClosed
        })
    }

    async fn flush(&self) -> StoreResult<()> {
        let mut pending = self.shared.pending.subscribe();
        loop {
            let drained = *pending.borrow_and_update() == 0;
            if drained {
                return Ok(());
            }
            pending
                .changed()
                .await
                .map_err(|_| StoreError::SessionClosed)?;
        }
    }

    fn has_pending_operations(&self) -> bool {
        *self.shared.pending.borrow() > 0
    }

    fn count_pending_errors(&self) -> usize {
        self.shared.errors.lock().errors.len()
    }

    fn pending_errors(&self) -> PendingErrors {
        let buffer = std::mem::take(&mut *self.shared.errors.lock());
        PendingErrors::new(buffer.errors, buffer.overflowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::StatusCode;
    use crate::schema::{ColumnSchema, NativeSchema, NativeType};
    use crate::table::Table;

    fn setup() -> (Arc<MemoryStore>, Table) {
        let store = Arc::new(MemoryStore::new());
        let table = store
            .create_table(
                "t",
                NativeSchema::new(vec![ColumnSchema::key("id", NativeType::Int64)]).unwrap(),
            )
            .unwrap();
        (store, table)
    }

    fn insert(table: &Table, id: i64) -> Operation {
        let mut op = table.new_insert();
        op.row_mut().add_i64("id", id).unwrap();
        op
    }

    #[tokio::test]
    async fn test_flush_waits_for_all_operations() {
        let (store, table) = setup();
        let session = MemorySession::with_options(
            Arc::clone(&store),
            SessionOptions::default().with_apply_delay(Duration::from_millis(2)),
        );

        for id in 0..10 {
            session.apply(insert(&table, id)).await.unwrap();
        }
        session.flush().await.unwrap();

        assert!(!session.has_pending_operations());
        assert_eq!(store.row_count("t").unwrap(), 10);
    }

    #[tokio::test]
    async fn test_errors_collected_in_order() {
        let (store, table) = setup();
        let session = MemorySession::with_options(store, SessionOptions::default().with_ts_uuid("ts-9"));

        session.apply(insert(&table, 1)).await.unwrap();
        session.apply(insert(&table, 1)).await.unwrap();
        session.apply(insert(&table, 1)).await.unwrap();
        session.flush().await.unwrap();

        assert_eq!(session.count_pending_errors(), 2);
        let errors = session.pending_errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.row_errors()[0].error_status().code(), StatusCode::AlreadyPresent);
        assert_eq!(errors.row_errors()[0].ts_uuid(), "ts-9");
        assert_eq!(session.count_pending_errors(), 0);
    }

    #[tokio::test]
    async fn test_error_buffer_overflow() {
        let (store, table) = setup();
        let session = MemorySession::with_options(
            store,
            SessionOptions::default().with_error_buffer_capacity(1),
        );

        for _ in 0..4 {
            session.apply(insert(&table, 1)).await.unwrap();
        }
        session.flush().await.unwrap();

        let errors = session.pending_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors.is_overflowed());
    }
}
