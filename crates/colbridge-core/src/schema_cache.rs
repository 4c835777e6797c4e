//! Per-table cache of generic schemas.
//!
//! A table's generic schema is derived once from its store schema and then
//! shared by every reader for the lifetime of the cache. Entries are never
//! evicted: a table handle's schema does not change.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use colbridge_client::Table;
use colbridge_common::RowSchema;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::BridgeResult;
use crate::type_bridge::schema_for;

/// Statistics for schema cache lookups.
#[derive(Debug, Default)]
pub struct SchemaCacheStats {
    /// Lookups served from the cache.
    hits: AtomicU64,
    /// Lookups that derived a schema.
    misses: AtomicU64,
}

impl SchemaCacheStats {
    /// Returns cache hits.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns cache misses, i.e. schema derivations.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// Cache of generic schemas keyed by table name.
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: RwLock<HashMap<String, Arc<RowSchema>>>,
    stats: SchemaCacheStats,
}

impl SchemaCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the generic schema of a table, deriving it on first use.
    ///
    /// Hits only take the shared lock. A miss takes the exclusive lock and
    /// checks again before deriving, so concurrent first callers derive the
    /// schema once. Derivation failures are not cached.
    pub fn get_schema(&self, table: &Table) -> BridgeResult<Arc<RowSchema>> {
        if let Some(schema) = self.schemas.read().get(table.name()) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(schema));
        }

        let mut schemas = self.schemas.write();
        if let Some(schema) = schemas.get(table.name()) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(schema));
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let schema = Arc::new(schema_for(table.schema())?);
        debug!(table = table.name(), schema = %schema, "cached table schema");
        schemas.insert(table.name().to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Returns the number of cached schemas.
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }

    /// Returns lookup statistics.
    pub fn stats(&self) -> &SchemaCacheStats {
        &self.stats
    }
}
