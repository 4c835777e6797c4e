//! # colbridge-core
//!
//! The typed mutation and scan bridge between generic rows and a column
//! store.
//!
//! ## Write path
//!
//! Planned rows carry their mutation kind in a reserved marker field. The
//! [`MutationBuilder`](mutation::MutationBuilder) turns them into store
//! operations field by field through the [`type_bridge`], and the
//! [`BatchApplier`](applier::BatchApplier) submits them to a session and
//! fails the whole batch on the first rejected operation.
//!
//! ## Read path
//!
//! The [`ExistenceScanner`](scanner::ExistenceScanner) folds a batch of
//! filter rows into one scan with an in-list predicate per filter field and
//! decodes the results through the [`SchemaCache`](schema_cache::SchemaCache).
//!
//! [`StoreOutput`] ties both paths to one configured table.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accumulators;
pub mod applier;
pub mod bulk;
pub mod error;
pub mod mutation;
pub mod output;
pub mod scanner;
pub mod schema_cache;
pub mod token;
pub mod type_bridge;

pub use accumulators::{AccumulatorKind, AccumulatorRequest, Accumulators, ScanMetrics};
pub use applier::BatchApplier;
pub use bulk::{BulkWriteOptions, BulkWriter, Dataset, SessionBulkWriter};
pub use error::{BridgeError, BridgeResult, ErrorCode};
pub use mutation::{MutationBuilder, SUPPORTED_MUTATION_KINDS};
pub use output::StoreOutput;
pub use scanner::ExistenceScanner;
pub use schema_cache::SchemaCache;
pub use token::{StoreTokenProvider, TokenProvider};
