//! Mutation kinds and the planned-row marker field.
//!
//! Planners annotate every row they emit with the kind of change it
//! represents by adding a string field named [`MUTATION_KIND_FIELD`].

use std::fmt;
use std::str::FromStr;

use super::{DataType, Row, Value};
use crate::constants::MUTATION_KIND_FIELD;
use crate::error::{ModelError, ModelResult};

/// The intent of a planned row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MutationKind {
    /// No change is required.
    None,
    /// Insert a new row.
    Insert,
    /// Update an existing row.
    Update,
    /// Delete an existing row.
    Delete,
    /// Insert or update.
    Upsert,
    /// Replace the whole target.
    Overwrite,
}

impl MutationKind {
    /// All kinds in declaration order.
    pub const ALL: [MutationKind; 6] = [
        MutationKind::None,
        MutationKind::Insert,
        MutationKind::Update,
        MutationKind::Delete,
        MutationKind::Upsert,
        MutationKind::Overwrite,
    ];

    /// Returns the canonical upper-case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MutationKind::None => "NONE",
            MutationKind::Insert => "INSERT",
            MutationKind::Update => "UPDATE",
            MutationKind::Delete => "DELETE",
            MutationKind::Upsert => "UPSERT",
            MutationKind::Overwrite => "OVERWRITE",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MutationKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MutationKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::UnknownMutationKind {
                kind: s.to_string(),
            })
    }
}

/// Reads the mutation kind marker of a planned row.
pub fn mutation_kind(row: &Row) -> ModelResult<MutationKind> {
    let value = row.field_value(MUTATION_KIND_FIELD).map_err(|e| match e {
        ModelError::FieldNotFound { .. } => ModelError::MissingMutationKind {
            field: MUTATION_KIND_FIELD,
        },
        other => other,
    })?;

    match value {
        Value::String(name) => name.parse(),
        Value::Null => Err(ModelError::MissingMutationKind {
            field: MUTATION_KIND_FIELD,
        }),
        other => Err(ModelError::UnknownMutationKind {
            kind: other.to_string(),
        }),
    }
}

/// Returns the row without its mutation kind marker.
pub fn strip_mutation_kind(row: &Row) -> Row {
    row.without_field(MUTATION_KIND_FIELD)
}

/// Returns the row with its mutation kind marker set.
pub fn with_mutation_kind(row: &Row, kind: MutationKind) -> ModelResult<Row> {
    row.with_field(MUTATION_KIND_FIELD, DataType::String, Value::from(kind.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(kind: &str) -> Row {
        Row::builder()
            .field(MUTATION_KIND_FIELD, DataType::String, kind)
            .field("id", DataType::Int64, 1i64)
            .build()
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("UPSERT".parse::<MutationKind>(), Ok(MutationKind::Upsert));
        assert_eq!("delete".parse::<MutationKind>(), Ok(MutationKind::Delete));
        assert!("MERGE".parse::<MutationKind>().is_err());
    }

    #[test]
    fn test_read_marker() {
        assert_eq!(mutation_kind(&planned("INSERT")), Ok(MutationKind::Insert));
        assert_eq!(
            mutation_kind(&planned("MERGE")),
            Err(ModelError::UnknownMutationKind {
                kind: "MERGE".to_string()
            })
        );

        let unmarked = Row::builder().field("id", DataType::Int64, 1i64).build();
        assert_eq!(
            mutation_kind(&unmarked),
            Err(ModelError::MissingMutationKind {
                field: MUTATION_KIND_FIELD
            })
        );
    }

    #[test]
    fn test_strip_and_set_marker() {
        let stripped = strip_mutation_kind(&planned("UPDATE"));
        assert!(!stripped.schema().unwrap().contains(MUTATION_KIND_FIELD));
        assert_eq!(stripped.len(), 1);

        let marked = with_mutation_kind(&stripped, MutationKind::Delete).unwrap();
        assert_eq!(mutation_kind(&marked), Ok(MutationKind::Delete));
    }
}
