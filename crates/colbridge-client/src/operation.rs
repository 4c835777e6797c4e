//! Write operations and their per-row outcomes.

use std::fmt;
use std::sync::Arc;

use crate::row::PartialRow;
use crate::schema::NativeSchema;

/// Kind of a write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Insert a row; fails if the key exists.
    Insert,
    /// Update a row; fails if the key does not exist.
    Update,
    /// Delete a row; fails if the key does not exist.
    Delete,
    /// Insert, or update if the key exists.
    Upsert,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Insert => write!(f, "INSERT"),
            OperationKind::Update => write!(f, "UPDATE"),
            OperationKind::Delete => write!(f, "DELETE"),
            OperationKind::Upsert => write!(f, "UPSERT"),
        }
    }
}

/// A write against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    kind: OperationKind,
    table: String,
    row: PartialRow,
}

impl Operation {
    /// Creates an operation with an empty row buffer.
    pub fn new(kind: OperationKind, table: impl Into<String>, schema: Arc<NativeSchema>) -> Self {
        Self {
            kind,
            table: table.into(),
            row: PartialRow::new(schema),
        }
    }

    /// Returns the operation kind.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Returns the target table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the row buffer.
    pub fn row(&self) -> &PartialRow {
        &self.row
    }

    /// Returns the row buffer for filling in.
    pub fn row_mut(&mut self) -> &mut PartialRow {
        &mut self.row
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.table, self.row)
    }
}

/// Outcome class of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// The row key already exists.
    AlreadyPresent,
    /// The row key does not exist.
    NotFound,
    /// The operation is malformed.
    InvalidArgument,
    /// The server cannot serve the request right now.
    ServiceUnavailable,
    /// The request timed out on the server.
    TimedOut,
    /// The server was in a state that prevented the write.
    IllegalState,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::AlreadyPresent => write!(f, "Already present"),
            StatusCode::NotFound => write!(f, "Not found"),
            StatusCode::InvalidArgument => write!(f, "Invalid argument"),
            StatusCode::ServiceUnavailable => write!(f, "Service unavailable"),
            StatusCode::TimedOut => write!(f, "Timed out"),
            StatusCode::IllegalState => write!(f, "Illegal state"),
        }
    }
}

/// Status reported for a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: StatusCode,
    message: String,
}

impl Status {
    /// Creates a status.
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Returns the status code.
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Returns the server's message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A per-operation failure collected by a session.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    status: Status,
    operation: Operation,
    ts_uuid: String,
}

impl RowError {
    /// Creates a row error.
    pub fn new(status: Status, operation: Operation, ts_uuid: impl Into<String>) -> Self {
        Self {
            status,
            operation,
            ts_uuid: ts_uuid.into(),
        }
    }

    /// Returns the failure status.
    pub fn error_status(&self) -> &Status {
        &self.status
    }

    /// Returns the operation that failed.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Returns the identity of the tablet server that rejected the operation.
    pub fn ts_uuid(&self) -> &str {
        &self.ts_uuid
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Row error for primary key={}, tablet server={}, status={}",
            self.operation.row(),
            self.ts_uuid,
            self.status
        )
    }
}

/// Errors drained from a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingErrors {
    row_errors: Vec<RowError>,
    overflowed: bool,
}

impl PendingErrors {
    /// Creates a set of drained errors.
    pub fn new(row_errors: Vec<RowError>, overflowed: bool) -> Self {
        Self {
            row_errors,
            overflowed,
        }
    }

    /// Returns the errors in the order they were collected.
    pub fn row_errors(&self) -> &[RowError] {
        &self.row_errors
    }

    /// Returns true if the session dropped errors past its buffer limit.
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Returns the number of errors held.
    pub fn len(&self) -> usize {
        self.row_errors.len()
    }

    /// Returns true if no errors are held.
    pub fn is_empty(&self) -> bool {
        self.row_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSchema, NativeType};

    fn operation() -> Operation {
        let schema = Arc::new(
            NativeSchema::new(vec![
                ColumnSchema::key("id", NativeType::Int64),
                ColumnSchema::new("name", NativeType::String),
            ])
            .unwrap(),
        );
        let mut op = Operation::new(OperationKind::Upsert, "orders", schema);
        op.row_mut().add_i64("id", 1).unwrap();
        op.row_mut().add_string("name", "a").unwrap();
        op
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(operation().to_string(), "UPSERT orders (id=1, name=a)");
    }

    #[test]
    fn test_row_error_accessors() {
        let error = RowError::new(
            Status::new(StatusCode::AlreadyPresent, "key already present"),
            operation(),
            "ts-1",
        );
        assert_eq!(error.error_status().to_string(), "Already present: key already present");
        assert_eq!(error.error_status().code(), StatusCode::AlreadyPresent);
        assert_eq!(error.ts_uuid(), "ts-1");
        assert_eq!(error.operation().kind(), OperationKind::Upsert);
    }

    #[test]
    fn test_pending_errors() {
        let pending = PendingErrors::default();
        assert!(pending.is_empty());
        assert!(!pending.is_overflowed());
    }
}
