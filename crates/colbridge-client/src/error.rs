//! Error types for the store client.

use thiserror::Error;

use crate::schema::NativeType;

/// Store client error type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Table already exists.
    #[error("table already exists: {0}")]
    TableExists(String),

    /// Column does not exist in the table schema.
    #[error("unknown column: {0}")]
    ColumnNotFound(String),

    /// A cell was written or read with the wrong native type.
    #[error("column '{column}' is of type {expected}, not {requested}")]
    ColumnTypeMismatch {
        /// Column name.
        column: String,
        /// The column's native type.
        expected: NativeType,
        /// The accessor or value type used.
        requested: &'static str,
    },

    /// A NULL cell was read through a typed accessor.
    #[error("column '{0}' is null")]
    NullValue(String),

    /// A decimal does not fit the column's precision and scale.
    #[error("decimal does not fit column '{column}' of type {expected}")]
    DecimalOutOfRange {
        /// Column name.
        column: String,
        /// The column's native type.
        expected: NativeType,
    },

    /// The schema definition is invalid.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// The session was closed.
    #[error("session closed")]
    SessionClosed,

    /// The scanner has no more rows.
    #[error("scanner exhausted")]
    ScannerExhausted,

    /// Authentication failed or is unavailable.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Network error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for store client operations.
pub type StoreResult<T> = Result<T, StoreError>;
