//! Bridge error types.
//!
//! Every failure surfaced by the bridge is a [`BridgeError`]. Each variant
//! maps to a stable [`ErrorCode`] for programmatic handling.

use std::fmt;

use colbridge_client::{NativeType, StoreError};
use colbridge_common::{Decimal, ModelError, Row};
use thiserror::Error;

/// Error codes for categorizing bridge errors.
///
/// These codes are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Internal error (bug).
    Internal = 0x0001,
    /// Invalid argument provided.
    InvalidArgument = 0x0003,
    /// Operation timed out.
    Timeout = 0x0004,

    // Type errors (0x0100 - 0x01FF)
    /// Store column type has no generic counterpart.
    UnsupportedType = 0x0100,
    /// Generic value does not match the store column type.
    TypeMismatch = 0x0101,
    /// Decimal does not fit the column precision or scale.
    DecimalOutOfRange = 0x0102,

    // Input errors (0x0200 - 0x02FF)
    /// Row has no schema.
    MissingSchema = 0x0200,
    /// No filter rows were provided.
    MissingFilter = 0x0201,
    /// Planned row has no mutation kind.
    MissingMutationKind = 0x0202,
    /// Mutation kind is not supported by the output.
    UnsupportedMutationKind = 0x0203,
    /// Field names no column of the table.
    ColumnNotFound = 0x0204,

    // Store errors (0x0300 - 0x03FF)
    /// The store rejected an applied operation.
    RemoteApply = 0x0300,
    /// Store client failure.
    Store = 0x0301,

    // Configuration errors (0x0400 - 0x04FF)
    /// Invalid configuration.
    InvalidConfig = 0x0400,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Type",
            0x02 => "Input",
            0x03 => "Store",
            0x04 => "Config",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The error type for bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // ==========================================================================
    // Type Errors
    // ==========================================================================
    /// A store column type has no generic counterpart.
    #[error("unsupported store column type {native_type} for column '{column}'")]
    UnsupportedType {
        /// Column name.
        column: String,
        /// The unsupported type.
        native_type: NativeType,
    },

    /// A planned value does not match the store column type.
    #[error(
        "unexpected type found in planned row: for table '{table}', field '{field}', \
         expected store type '{expected}' but found '{actual}'. Row: {row}"
    )]
    TypeMismatch {
        /// Target table.
        table: String,
        /// Offending field.
        field: String,
        /// The column's store type.
        expected: NativeType,
        /// Runtime type of the value found.
        actual: &'static str,
        /// The whole planned row.
        row: Box<Row>,
    },

    /// A decimal does not fit the column's precision and scale exactly.
    #[error("decimal {value} does not fit field '{field}' of table '{table}' with type {expected}")]
    DecimalOutOfRange {
        /// Target table.
        table: String,
        /// Offending field.
        field: String,
        /// The column's store type.
        expected: NativeType,
        /// The rejected value.
        value: Decimal,
    },

    // ==========================================================================
    // Input Errors
    // ==========================================================================
    /// A row that must carry a schema does not.
    #[error("{context} does not contain a schema")]
    MissingSchema {
        /// What the row was.
        context: &'static str,
    },

    /// An existence lookup was given no filters.
    #[error("existence filter was not provided")]
    MissingFilter,

    /// A planned row carries no mutation kind.
    #[error("planned row does not carry a '{field}' field")]
    MissingMutationKind {
        /// Name of the marker field.
        field: &'static str,
    },

    /// The mutation kind is unknown or not supported by the output.
    #[error("unsupported mutation kind: {kind}")]
    UnsupportedMutationKind {
        /// The rejected kind.
        kind: String,
    },

    /// A field names no column of the table.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound {
        /// The missing column.
        column: String,
        /// The table name.
        table: String,
    },

    /// Other malformed input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Store Errors
    // ==========================================================================
    /// The store rejected at least one operation of a batch.
    ///
    /// Only the first row error is described. The others are counted in
    /// `suppressed`.
    #[error("store output error '{status}' during operation '{operation}' at tablet server '{server}'")]
    RemoteApply {
        /// Status of the first failed operation.
        status: String,
        /// The first failed operation.
        operation: String,
        /// Server that reported the failure.
        server: String,
        /// Number of further row errors not described.
        suppressed: usize,
    },

    /// The session did not drain within the configured timeout.
    ///
    /// The submitted operations may still be applied, so this is not
    /// retryable.
    #[error("timed out after {timeout_ms}ms waiting for pending operations")]
    ApplyTimeout {
        /// Timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The store client failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },
}

impl BridgeError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedType { .. } => ErrorCode::UnsupportedType,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::DecimalOutOfRange { .. } => ErrorCode::DecimalOutOfRange,
            Self::MissingSchema { .. } => ErrorCode::MissingSchema,
            Self::MissingFilter => ErrorCode::MissingFilter,
            Self::MissingMutationKind { .. } => ErrorCode::MissingMutationKind,
            Self::UnsupportedMutationKind { .. } => ErrorCode::UnsupportedMutationKind,
            Self::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            Self::InvalidInput { .. } => ErrorCode::InvalidArgument,
            Self::RemoteApply { .. } => ErrorCode::RemoteApply,
            Self::ApplyTimeout { .. } => ErrorCode::Timeout,
            Self::Store(StoreError::Internal(_)) => ErrorCode::Internal,
            Self::Store(_) => ErrorCode::Store,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(StoreError::NetworkError(_)))
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a missing schema error.
    #[must_use]
    pub const fn missing_schema(context: &'static str) -> Self {
        Self::MissingSchema { context }
    }
}

impl From<ModelError> for BridgeError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::MissingSchema => Self::MissingSchema { context: "row" },
            ModelError::MissingMutationKind { field } => Self::MissingMutationKind { field },
            ModelError::UnknownMutationKind { kind } => Self::UnsupportedMutationKind { kind },
            other => Self::InvalidInput {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use colbridge_common::MUTATION_KIND_FIELD;

    #[test]
    fn test_error_code() {
        let err = BridgeError::MissingFilter;
        assert_eq!(err.code(), ErrorCode::MissingFilter);
        assert_eq!(err.code().category(), "Input");
        assert_eq!(err.code().as_u16(), 0x0201);
    }

    #[test]
    fn test_remote_apply_display() {
        let err = BridgeError::RemoteApply {
            status: "Already present: key already present".to_string(),
            operation: "INSERT orders (id=1)".to_string(),
            server: "ts-1".to_string(),
            suppressed: 4,
        };
        assert_eq!(
            err.to_string(),
            "store output error 'Already present: key already present' during operation \
             'INSERT orders (id=1)' at tablet server 'ts-1'"
        );
        assert_eq!(err.code().category(), "Store");
    }

    #[test]
    fn test_from_model_error() {
        let err: BridgeError = ModelError::MissingMutationKind {
            field: MUTATION_KIND_FIELD,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::MissingMutationKind);

        let err: BridgeError = ModelError::UnknownMutationKind {
            kind: "MERGE".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "unsupported mutation kind: MERGE");

        let err: BridgeError = ModelError::MissingSchema.into();
        assert_eq!(err.code(), ErrorCode::MissingSchema);
    }

    #[test]
    fn test_from_store_error() {
        let err: BridgeError = StoreError::NetworkError("reset".to_string()).into();
        assert_eq!(err.code(), ErrorCode::Store);
        assert!(err.is_retryable());
        assert!(!BridgeError::MissingFilter.is_retryable());
        assert!(!BridgeError::ApplyTimeout { timeout_ms: 10 }.is_retryable());
    }
}
