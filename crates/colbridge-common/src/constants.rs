//! System-wide constants for colbridge.
//!
//! Configuration keys and reserved names are part of the external contract
//! with the pipeline and must not change between releases.

// =============================================================================
// Configuration Keys
// =============================================================================

/// Connection identifier of the remote store (master addresses).
pub const CONNECTION_CONFIG_NAME: &str = "connection";

/// Name of the target table.
pub const TABLE_CONFIG_NAME: &str = "table.name";

/// Whether bulk inserts ignore duplicate-key rows.
pub const INSERT_IGNORE_CONFIG_NAME: &str = "insert.ignore";

/// Whether planned fields without a matching table column are dropped.
pub const IGNORE_MISSING_COLUMNS_CONFIG_NAME: &str = "ignore.missing.columns";

/// Whether the store connection is secured.
pub const IS_SECURE_CONFIG_NAME: &str = "secure";

/// Prefix of the Kerberos sub-configuration.
pub const KERBEROS_PREFIX: &str = "kerberos";

/// Optional bound on how long a batch apply may wait for the session to drain.
pub const APPLY_TIMEOUT_CONFIG_NAME: &str = "apply.timeout";

// =============================================================================
// Reserved Fields
// =============================================================================

/// Field carrying the mutation kind of a planned row.
///
/// The field is metadata added by the planner and is stripped before the
/// row is converted into a store operation.
pub const MUTATION_KIND_FIELD: &str = "_mutation_type";

// =============================================================================
// Accumulators
// =============================================================================

/// Long accumulator counting scanners opened for existence lookups.
pub const ACCUMULATOR_NUMBER_OF_SCANNERS: &str = "Number of store scanners";

/// Long accumulator counting filter rows submitted to scanners.
pub const ACCUMULATOR_NUMBER_OF_FILTERS_SCANNED: &str = "Number of filters scanned in store";

/// Double accumulator of wall-clock seconds spent scanning.
pub const ACCUMULATOR_SECONDS_SCANNING: &str = "Seconds spent scanning store";

// =============================================================================
// Decimal Limits
// =============================================================================

/// Maximum decimal precision representable by the bridge.
pub const MAX_DECIMAL_PRECISION: u8 = 38;

/// Alias under which the output registers itself with the pipeline.
pub const OUTPUT_ALIAS: &str = "colstore";
