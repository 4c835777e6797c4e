//! Fail-fast batch application.

use std::time::Duration;

use colbridge_client::{Operation, Session, StatusCode};
use tracing::{debug, warn};

use crate::error::{BridgeError, BridgeResult};

/// Applies batches of operations through a session.
///
/// A batch succeeds only if every operation succeeds. When the store
/// rejects any operation the call fails with [`BridgeError::RemoteApply`]
/// describing the first rejected operation; nothing is retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchApplier {
    timeout: Option<Duration>,
    ignore_duplicate_rows: bool,
}

impl BatchApplier {
    /// Creates an applier that waits for the session without a bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the wait for the session to drain.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Treats rows rejected as already present as applied.
    pub fn ignoring_duplicate_rows(mut self, ignore: bool) -> Self {
        self.ignore_duplicate_rows = ignore;
        self
    }

    /// Returns the drain timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Submits the operations in order and waits until all have completed.
    ///
    /// Operations and row errors left on the session by an earlier batch
    /// that timed out are drained and discarded before this batch is
    /// submitted, so a reported error always belongs to this batch.
    pub async fn apply(&self, operations: Vec<Operation>, session: &dyn Session) -> BridgeResult<()> {
        if session.has_pending_operations() || session.count_pending_errors() > 0 {
            self.drain(session).await?;
            let stale = session.pending_errors();
            if !stale.is_empty() {
                warn!(
                    discarded = stale.len(),
                    "discarding row errors left by an earlier batch"
                );
            }
        }

        let count = operations.len();
        for operation in operations {
            session.apply(operation).await?;
        }
        self.drain(session).await?;

        if session.count_pending_errors() > 0 {
            let pending = session.pending_errors();
            let mut errors = pending.row_errors().iter().filter(|error| {
                !(self.ignore_duplicate_rows
                    && error.error_status().code() == StatusCode::AlreadyPresent)
            });
            if let Some(first) = errors.next() {
                let suppressed = errors.count();
                if suppressed > 0 || pending.is_overflowed() {
                    warn!(
                        suppressed,
                        overflowed = pending.is_overflowed(),
                        "reporting the first of several row errors"
                    );
                }
                return Err(BridgeError::RemoteApply {
                    status: first.error_status().to_string(),
                    operation: first.operation().to_string(),
                    server: first.ts_uuid().to_string(),
                    suppressed,
                });
            }
        }

        debug!(operations = count, "applied batch");
        Ok(())
    }

    async fn drain(&self, session: &dyn Session) -> BridgeResult<()> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, session.flush())
                .await
                .map_err(|_| BridgeError::ApplyTimeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })??,
            None => session.flush().await?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use colbridge_client::memory::{MemorySession, MemoryStore, SessionOptions};
    use colbridge_client::{ColumnSchema, NativeSchema, NativeType, Table};

    fn setup() -> (Arc<MemoryStore>, Table) {
        let store = Arc::new(MemoryStore::new());
        let table = store
            .create_table(
                "orders",
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
    async fn test_apply_success() {
        let (store, table) = setup();
        let session = MemorySession::new(Arc::clone(&store));

        BatchApplier::new()
            .apply((0..5).map(|id| insert(&table, id)).collect(), &session)
            .await
            .unwrap();
        assert_eq!(store.row_count("orders").unwrap(), 5);
    }

    #[tokio::test]
    async fn test_first_error_wins() {
        let (store, table) = setup();
        store.apply(&insert(&table, 1)).unwrap();
        store.apply(&insert(&table, 2)).unwrap();
        let session = MemorySession::with_options(store, SessionOptions::default().with_ts_uuid("ts-7"));

        let operations = vec![insert(&table, 1), insert(&table, 3), insert(&table, 2)];
        let err = BatchApplier::new().apply(operations, &session).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "store output error 'Already present: key already present' during operation \
             'INSERT orders (id=1)' at tablet server 'ts-7'"
        );
        match err {
            BridgeError::RemoteApply { suppressed, .. } => assert_eq!(suppressed, 1),
            other => panic!("expected remote apply error, got {:?}", other),
        }
        assert_eq!(session.count_pending_errors(), 0);
    }

    #[tokio::test]
    async fn test_ignoring_duplicate_rows() {
        let (store, table) = setup();
        store.apply(&insert(&table, 1)).unwrap();
        let session = MemorySession::new(Arc::clone(&store));

        BatchApplier::new()
            .ignoring_duplicate_rows(true)
            .apply(vec![insert(&table, 1), insert(&table, 2)], &session)
            .await
            .unwrap();
        assert_eq!(store.row_count("orders").unwrap(), 2);

        let mut update = table.new_update();
        update.row_mut().add_i64("id", 42).unwrap();
        let err = BatchApplier::new()
            .ignoring_duplicate_rows(true)
            .apply(vec![insert(&table, 1), update], &session)
            .await
            .unwrap_err();
        match err {
            BridgeError::RemoteApply { status, suppressed, .. } => {
                assert_eq!(status, "Not found: key not found");
                assert_eq!(suppressed, 0);
            }
            other => panic!("expected remote apply error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (store, _) = setup();
        let session = MemorySession::new(store);
        BatchApplier::new().apply(Vec::new(), &session).await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout() {
        let (store, table) = setup();
        let session = MemorySession::with_options(
            store,
            SessionOptions::default().with_apply_delay(Duration::from_millis(200)),
        );

        let err = BatchApplier::new()
            .with_timeout(Duration::from_millis(20))
            .apply(vec![insert(&table, 1), insert(&table, 2)], &session)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::ApplyTimeout { timeout_ms: 20 }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_timed_out_batch_errors_stay_with_it() {
        let (store, table) = setup();
        let session = MemorySession::with_options(
            Arc::clone(&store),
            SessionOptions::default().with_apply_delay(Duration::from_millis(50)),
        );
        let bounded = BatchApplier::new().with_timeout(Duration::from_millis(10));

        let err = bounded
            .apply(vec![insert(&table, 7), insert(&table, 7)], &session)
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::Timeout);

        let err = bounded.apply(vec![insert(&table, 8)], &session).await.unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::Timeout);

        let mut upsert = table.new_upsert();
        upsert.row_mut().add_i64("id", 9).unwrap();
        BatchApplier::new().apply(vec![upsert], &session).await.unwrap();

        assert_eq!(session.count_pending_errors(), 0);
        assert!(!session.has_pending_operations());
        assert_eq!(store.row_count("orders").unwrap(), 2);
    }
}
