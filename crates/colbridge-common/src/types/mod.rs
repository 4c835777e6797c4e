//! Type definitions for the generic row model.
//!
//! This module contains the store-agnostic values, semantic types and rows
//! that form the common currency between pipelines and the bridge.

mod data_type;
mod decimal;
mod mutation;
mod row;
mod value;

pub use data_type::DataType;
pub use decimal::Decimal;
pub use mutation::{mutation_kind, strip_mutation_kind, with_mutation_kind, MutationKind};
pub use row::{Field, Row, RowBuilder, RowSchema};
pub use value::Value;
