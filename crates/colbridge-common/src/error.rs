//! Errors raised while interpreting generic rows.

use thiserror::Error;

/// Error produced by the generic row model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A decimal literal could not be parsed.
    #[error("invalid decimal literal: '{input}'")]
    InvalidDecimal {
        /// The rejected input.
        input: String,
    },

    /// A decimal has more digits than its precision allows.
    #[error("decimal precision {precision} and scale {scale} are out of range")]
    DecimalPrecision {
        /// Requested precision.
        precision: u8,
        /// Requested scale.
        scale: u8,
    },

    /// A mutation kind name is not part of the planner vocabulary.
    #[error("unknown mutation kind: '{kind}'")]
    UnknownMutationKind {
        /// The rejected name.
        kind: String,
    },

    /// The row carries no mutation kind marker.
    #[error("row does not carry a '{field}' field")]
    MissingMutationKind {
        /// Name of the marker field.
        field: &'static str,
    },

    /// The row has no schema, so fields cannot be resolved by name.
    #[error("row does not contain a schema")]
    MissingSchema,

    /// A field was looked up by a name the schema does not have.
    #[error("field not found: '{name}'")]
    FieldNotFound {
        /// The requested field name.
        name: String,
    },
}

/// Result type for generic row model operations.
pub type ModelResult<T> = Result<T, ModelError>;
