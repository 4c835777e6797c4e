//! Connection-level traits implemented by store clients.
//!
//! The bridge never opens connections itself. A [`ConnectionProvider`]
//! hands out the client, session and table handles it borrows for the
//! duration of one call.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::operation::{Operation, PendingErrors};
use crate::scan::{Scanner, ScannerBuilder};
use crate::table::Table;

/// Client-level access to the store.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Opens a table by name.
    async fn open_table(&self, name: &str) -> StoreResult<Table>;

    /// Starts describing a scan of the table.
    fn new_scanner_builder(&self, table: &Table) -> ScannerBuilder {
        ScannerBuilder::new(table.clone())
    }

    /// Opens a scanner for a described scan.
    async fn open_scanner(&self, builder: ScannerBuilder) -> StoreResult<Box<dyn Scanner>>;

    /// Exports credentials other processes can use to authenticate as this client.
    async fn export_authentication_credentials(&self) -> StoreResult<Vec<u8>>;
}

/// A write session.
///
/// Applied operations are buffered and flushed in the background. Errors
/// for individual operations are collected on the session and drained with
/// [`pending_errors`](Session::pending_errors).
#[async_trait]
pub trait Session: Send + Sync {
    /// Buffers an operation for sending. Operations are sent in apply order.
    async fn apply(&self, operation: Operation) -> StoreResult<()>;

    /// Resolves once every applied operation has succeeded or failed.
    async fn flush(&self) -> StoreResult<()>;

    /// Returns true while applied operations are still outstanding.
    fn has_pending_operations(&self) -> bool;

    /// Returns the number of collected row errors.
    fn count_pending_errors(&self) -> usize;

    /// Drains the collected row errors.
    fn pending_errors(&self) -> PendingErrors;
}

/// Supplies live client, session and table handles for one connection.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Returns the client.
    fn client(&self) -> Arc<dyn StoreClient>;

    /// Returns the write session.
    async fn session(&self) -> StoreResult<Arc<dyn Session>>;

    /// Opens a table by name.
    async fn table(&self, name: &str) -> StoreResult<Table> {
        self.client().open_table(name).await
    }
}
