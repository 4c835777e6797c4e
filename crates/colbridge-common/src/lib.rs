//! # colbridge-common
//!
//! Common types, configuration and constants for colbridge.
//!
//! This crate provides the generic side of the bridge: the structured
//! record model that upstream pipelines produce and consume. It includes:
//!
//! - **Types**: `Value`, `Decimal`, `DataType`, `Row`, `RowSchema` and the
//!   `MutationKind` marker helpers
//! - **Config**: the output configuration surface (`OutputConfig`)
//! - **Errors**: `ModelError` for malformed generic input
//! - **Constants**: configuration keys, reserved field names, accumulator names
//!
//! ## Example
//!
//! ```rust
//! use colbridge_common::types::{DataType, Row, Value};
//!
//! let row = Row::builder()
//!     .field("id", DataType::Int64, Value::Int64(7))
//!     .field("name", DataType::String, Value::from("seven"))
//!     .build();
//!
//! assert_eq!(row.get_by_name("id"), Some(&Value::Int64(7)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{KerberosConfig, OutputConfig};
pub use constants::*;
pub use error::{ModelError, ModelResult};
pub use types::{DataType, Decimal, Field, MutationKind, Row, RowBuilder, RowSchema, Value};
