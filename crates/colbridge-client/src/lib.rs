//! # colbridge-client
//!
//! The native side of the bridge: how a column store describes tables,
//! buffers writes and returns scan results.
//!
//! - [`schema`]: column schemas and native type tags
//! - [`row`]: partial rows for writes, row results for reads
//! - [`operation`]: write operations, statuses and row errors
//! - [`scan`]: in-list predicates, scan requests, the [`Scanner`] trait
//! - [`client`]: the [`StoreClient`], [`Session`] and [`ConnectionProvider`] traits
//! - [`memory`]: an in-process implementation of all of the above
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use colbridge_client::memory::{MemoryClient, MemoryConnection, MemoryStore};
//! use colbridge_client::{ColumnSchema, ConnectionProvider, NativeSchema, NativeType, Session};
//!
//! # async fn example() -> colbridge_client::StoreResult<()> {
//! let store = Arc::new(MemoryStore::new());
//! let table = store.create_table(
//!     "orders",
//!     NativeSchema::new(vec![ColumnSchema::key("id", NativeType::Int64)])?,
//! )?;
//!
//! let connection = MemoryConnection::new(MemoryClient::new(store));
//! let session = connection.session().await?;
//! let mut insert = table.new_insert();
//! insert.row_mut().add_i64("id", 1)?;
//! session.apply(insert).await?;
//! session.flush().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod memory;
pub mod operation;
pub mod row;
pub mod scan;
pub mod schema;
pub mod table;
pub mod value;

pub use client::{ConnectionProvider, Session, StoreClient};
pub use error::{StoreError, StoreResult};
pub use operation::{Operation, OperationKind, PendingErrors, RowError, Status, StatusCode};
pub use row::{PartialRow, RowResult, RowResultBatch};
pub use scan::{InListPredicate, Scanner, ScannerBuilder, DEFAULT_BATCH_SIZE_ROWS};
pub use schema::{ColumnSchema, NativeSchema, NativeType, MAX_DECIMAL_PRECISION};
pub use table::Table;
pub use value::{decimal_fits, NativeValue};
