//! Native table schemas.
//!
//! A table schema is an ordered list of columns. Key columns come first and
//! together identify a row.

use std::collections::HashMap;
use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Maximum precision of a native decimal column.
pub const MAX_DECIMAL_PRECISION: u8 = 38;

/// Native column type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Microseconds since the Unix epoch.
    UnixtimeMicros,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// UTF-8 string.
    String,
    /// Opaque bytes.
    Binary,
    /// Boolean.
    Bool,
    /// Fixed-point decimal.
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Digits after the decimal point.
        scale: u8,
    },
    /// Days since the Unix epoch.
    Date,
    /// Length-bounded string.
    Varchar {
        /// Maximum number of characters.
        max_length: u16,
    },
    /// Nested array column.
    Array,
}

impl NativeType {
    /// Returns the type tag without parameters.
    pub const fn name(&self) -> &'static str {
        match self {
            NativeType::Int8 => "INT8",
            NativeType::Int16 => "INT16",
            NativeType::Int32 => "INT32",
            NativeType::Int64 => "INT64",
            NativeType::UnixtimeMicros => "UNIXTIME_MICROS",
            NativeType::Float => "FLOAT",
            NativeType::Double => "DOUBLE",
            NativeType::String => "STRING",
            NativeType::Binary => "BINARY",
            NativeType::Bool => "BOOL",
            NativeType::Decimal { .. } => "DECIMAL",
            NativeType::Date => "DATE",
            NativeType::Varchar { .. } => "VARCHAR",
            NativeType::Array => "ARRAY",
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Decimal { precision, scale } => {
                write!(f, "DECIMAL({}, {})", precision, scale)
            }
            NativeType::Varchar { max_length } => write!(f, "VARCHAR({})", max_length),
            other => f.write_str(other.name()),
        }
    }
}

/// Definition of one column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnSchema {
    name: String,
    native_type: NativeType,
    is_key: bool,
    nullable: bool,
}

impl ColumnSchema {
    /// Creates a nullable, non-key column.
    pub fn new(name: impl Into<String>, native_type: NativeType) -> Self {
        Self {
            name: name.into(),
            native_type,
            is_key: false,
            nullable: true,
        }
    }

    /// Creates a key column. Key columns are never nullable.
    pub fn key(name: impl Into<String>, native_type: NativeType) -> Self {
        Self {
            name: name.into(),
            native_type,
            is_key: true,
            nullable: false,
        }
    }

    /// Sets whether the column accepts NULL.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable && !self.is_key;
        self
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the native type.
    pub fn native_type(&self) -> NativeType {
        self.native_type
    }

    /// Returns true for primary key columns.
    pub fn is_key(&self) -> bool {
        self.is_key
    }

    /// Returns true if the column accepts NULL.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl fmt::Display for ColumnSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.native_type)?;
        if self.is_key {
            write!(f, " PRIMARY KEY")?;
        } else if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        Ok(())
    }
}

/// Ordered column list of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSchema {
    columns: Vec<ColumnSchema>,
    by_name: HashMap<String, usize>,
}

impl NativeSchema {
    /// Creates a schema, checking names are unique, keys lead and decimals are valid.
    pub fn new(columns: Vec<ColumnSchema>) -> StoreResult<Self> {
        if columns.is_empty() {
            return Err(StoreError::InvalidSchema("schema has no columns".to_string()));
        }
        if !columns[0].is_key() {
            return Err(StoreError::InvalidSchema(
                "the first column must be a key column".to_string(),
            ));
        }

        let mut by_name = HashMap::with_capacity(columns.len());
        let mut seen_value_column = false;
        for (index, column) in columns.iter().enumerate() {
            if column.is_key() && seen_value_column {
                return Err(StoreError::InvalidSchema(format!(
                    "key column '{}' follows a non-key column",
                    column.name()
                )));
            }
            seen_value_column |= !column.is_key();

            if let NativeType::Decimal { precision, scale } = column.native_type() {
                if precision == 0 || precision > MAX_DECIMAL_PRECISION || scale > precision {
                    return Err(StoreError::InvalidSchema(format!(
                        "column '{}' has invalid decimal attributes ({}, {})",
                        column.name(),
                        precision,
                        scale
                    )));
                }
            }

            if by_name.insert(column.name().to_string(), index).is_some() {
                return Err(StoreError::InvalidSchema(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
        }

        Ok(Self { columns, by_name })
    }

    /// Returns all columns in order.
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the position of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Returns the named column.
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Returns the named column or a `ColumnNotFound` error.
    pub fn require_column(&self, name: &str) -> StoreResult<&ColumnSchema> {
        self.column(name)
            .ok_or_else(|| StoreError::ColumnNotFound(name.to_string()))
    }

    /// Returns true if the table has a column with this name.
    pub fn has_column(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Returns the number of leading key columns.
    pub fn key_column_count(&self) -> usize {
        self.columns.iter().take_while(|c| c.is_key()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> NativeSchema {
        NativeSchema::new(vec![
            ColumnSchema::key("id", NativeType::Int64),
            ColumnSchema::new("name", NativeType::String),
            ColumnSchema::new(
                "amount",
                NativeType::Decimal {
                    precision: 10,
                    scale: 2,
                },
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup() {
        let schema = orders();
        assert_eq!(schema.column_count(), 3);
        assert_eq!(schema.column_index("amount"), Some(2));
        assert!(schema.has_column("name"));
        assert!(schema.column("missing").is_none());
        assert_eq!(
            schema.require_column("missing"),
            Err(StoreError::ColumnNotFound("missing".to_string()))
        );
        assert_eq!(schema.key_column_count(), 1);
    }

    #[test]
    fn test_invalid_schemas() {
        assert!(NativeSchema::new(vec![]).is_err());
        assert!(NativeSchema::new(vec![ColumnSchema::new("a", NativeType::Int32)]).is_err());
        assert!(NativeSchema::new(vec![
            ColumnSchema::key("a", NativeType::Int32),
            ColumnSchema::new("a", NativeType::Int32),
        ])
        .is_err());
        assert!(NativeSchema::new(vec![
            ColumnSchema::key("a", NativeType::Int32),
            ColumnSchema::new("b", NativeType::Int32),
            ColumnSchema::key("c", NativeType::Int32),
        ])
        .is_err());
        assert!(NativeSchema::new(vec![
            ColumnSchema::key("a", NativeType::Int32),
            ColumnSchema::new(
                "d",
                NativeType::Decimal {
                    precision: 4,
                    scale: 5
                }
            ),
        ])
        .is_err());
    }

    #[test]
    fn test_display() {
        let schema = orders();
        assert_eq!(schema.columns()[0].to_string(), "id INT64 PRIMARY KEY");
        assert_eq!(
            schema.columns()[2].native_type().to_string(),
            "DECIMAL(10, 2)"
        );
        assert_eq!(schema.columns()[2].native_type().name(), "DECIMAL");
    }

    #[test]
    fn test_key_columns_not_nullable() {
        let column = ColumnSchema::key("id", NativeType::Int64).nullable(true);
        assert!(!column.is_nullable());
    }
}
