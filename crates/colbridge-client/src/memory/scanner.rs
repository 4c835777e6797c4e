//! Scanners and client over a [`MemoryStore`].

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tracing::debug;

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};
use crate::row::{RowResult, RowResultBatch};
use crate::scan::{Scanner, ScannerBuilder};
use crate::schema::NativeSchema;
use crate::table::Table;
use crate::value::NativeValue;

use super::store::{Cells, MemoryStore};

/// Pages through a scan snapshot.
///
/// Binary cells of one batch share a single buffer, as they would when
/// decoded from a network response.
pub struct MemoryScanner {
    schema: Arc<NativeSchema>,
    remaining: VecDeque<Cells>,
    batch_size: usize,
}

impl MemoryScanner {
    fn new(schema: Arc<NativeSchema>, rows: Vec<Cells>, batch_size: usize) -> Self {
        Self {
            schema,
            remaining: rows.into(),
            batch_size,
        }
    }
}

#[async_trait]
impl Scanner for MemoryScanner {
    fn has_more_rows(&self) -> bool {
        !self.remaining.is_empty()
    }

    async fn next_rows(&mut self) -> StoreResult<RowResultBatch> {
        if self.remaining.is_empty() {
            return Err(StoreError::ScannerExhausted);
        }

        let take = self.batch_size.min(self.remaining.len());
        let mut rows: Vec<Cells> = self.remaining.drain(..take).collect();

        let mut buffer = BytesMut::new();
        for cell in rows.iter().flatten().flatten() {
            if let NativeValue::Binary(bytes) = cell {
                buffer.extend_from_slice(bytes);
            }
        }
        let buffer: Bytes = buffer.freeze();

        let mut offset = 0;
        for cell in rows.iter_mut().flatten().flatten() {
            if let NativeValue::Binary(bytes) = cell {
                let end = offset + bytes.len();
                *bytes = buffer.slice(offset..end);
                offset = end;
            }
        }

        Ok(RowResultBatch::new(
            rows.into_iter()
                .map(|cells| RowResult::new(Arc::clone(&self.schema), cells))
                .collect(),
        ))
    }
}

/// Client over a memory store.
///
/// Every opened scan request is recorded for inspection.
pub struct MemoryClient {
    store: Arc<MemoryStore>,
    credentials: Option<Vec<u8>>,
    scan_requests: Mutex<Vec<ScannerBuilder>>,
}

impl MemoryClient {
    /// Creates an unauthenticated client.
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            credentials: None,
            scan_requests: Mutex::new(Vec::new()),
        }
    }

    /// Sets the credentials exported by this client.
    pub fn with_credentials(mut self, credentials: impl Into<Vec<u8>>) -> Self {
        self.credentials = Some(credentials.into());
        self
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Returns the scan requests opened so far.
    pub fn scan_requests(&self) -> Vec<ScannerBuilder> {
        self.scan_requests.lock().clone()
    }

    /// Returns the scan requests opened so far and forgets them.
    pub fn take_scan_requests(&self) -> Vec<ScannerBuilder> {
        std::mem::take(&mut *self.scan_requests.lock())
    }
}

#[async_trait]
impl StoreClient for MemoryClient {
    async fn open_table(&self, name: &str) -> StoreResult<Table> {
        self.store.open_table(name)
    }

    async fn open_scanner(&self, builder: ScannerBuilder) -> StoreResult<Box<dyn Scanner>> {
        let (schema, rows) = self.store.scan_cells(&builder)?;
        debug!(
            table = builder.table().name(),
            predicates = builder.predicates().len(),
            rows = rows.len(),
            "opened memory scanner"
        );
        let batch_size = builder.batch_size();
        self.scan_requests.lock().push(builder);
        Ok(Box::new(MemoryScanner::new(schema, rows, batch_size)))
    }

    async fn export_authentication_credentials(&self) -> StoreResult<Vec<u8>> {
        self.credentials
            .clone()
            .ok_or_else(|| StoreError::AuthenticationFailed("client has no credentials".to_string()))
    }
}
