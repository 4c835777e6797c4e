//! Generic rows and row schemas.
//!
//! A `Row` is an ordered list of values, optionally paired with a
//! `RowSchema` naming and typing each position. Rows produced by the bridge
//! always carry a schema; rows supplied by callers may not.

use std::fmt;
use std::sync::Arc;

use super::{DataType, Value};
use crate::error::{ModelError, ModelResult};

/// A named, typed field of a row schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Semantic type.
    pub data_type: DataType,
    /// Whether NULL is allowed.
    pub nullable: bool,
}

impl Field {
    /// Creates a new nullable field.
    pub fn nullable(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.data_type)
    }
}

/// Ordered list of fields describing a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RowSchema {
    fields: Vec<Field>,
}

impl RowSchema {
    /// Creates a schema from fields in order.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Returns the fields.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the field at `index`.
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the position of the named field.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns true if the schema has a field with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }
}

impl fmt::Display for RowSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "struct<")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", field)?;
        }
        write!(f, ">")
    }
}

/// A generic row: values plus an optional schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: Option<Arc<RowSchema>>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row without a schema.
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            schema: None,
            values,
        }
    }

    /// Creates a row with a schema.
    pub fn with_schema(schema: Arc<RowSchema>, values: Vec<Value>) -> Self {
        debug_assert_eq!(schema.len(), values.len(), "schema and values disagree");
        Self {
            schema: Some(schema),
            values,
        }
    }

    /// Starts building a row field by field.
    pub fn builder() -> RowBuilder {
        RowBuilder::default()
    }

    /// Returns the schema, if any.
    pub fn schema(&self) -> Option<&Arc<RowSchema>> {
        self.schema.as_ref()
    }

    /// Returns all values in order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the value at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns true if the value at `index` is NULL or absent.
    pub fn is_null_at(&self, index: usize) -> bool {
        self.values.get(index).map_or(true, Value::is_null)
    }

    /// Returns the value of the named field, if the row has a schema with it.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.field_value(name).ok()
    }

    /// Returns the value of the named field.
    pub fn field_value(&self, name: &str) -> ModelResult<&Value> {
        let schema = self.schema.as_ref().ok_or(ModelError::MissingSchema)?;
        let index = schema
            .index_of(name)
            .ok_or_else(|| ModelError::FieldNotFound {
                name: name.to_string(),
            })?;
        self.values
            .get(index)
            .ok_or_else(|| ModelError::FieldNotFound {
                name: name.to_string(),
            })
    }

    /// Returns a copy of the row without the named field.
    ///
    /// Rows without a schema, or without that field, are returned unchanged.
    pub fn without_field(&self, name: &str) -> Row {
        let Some(schema) = &self.schema else {
            return self.clone();
        };
        let Some(index) = schema.index_of(name) else {
            return self.clone();
        };

        let mut fields = schema.fields().to_vec();
        fields.remove(index);
        let mut values = self.values.clone();
        values.remove(index);

        Row::with_schema(Arc::new(RowSchema::new(fields)), values)
    }

    /// Returns a copy of the row with the named field set, appending it if absent.
    pub fn with_field(&self, name: &str, data_type: DataType, value: Value) -> ModelResult<Row> {
        let schema = self.schema.as_ref().ok_or(ModelError::MissingSchema)?;
        let mut fields = schema.fields().to_vec();
        let mut values = self.values.clone();

        match schema.index_of(name) {
            Some(index) => {
                fields[index] = Field::nullable(name, data_type);
                values[index] = value;
            }
            None => {
                fields.push(Field::nullable(name, data_type));
                values.push(value);
            }
        }

        Ok(Row::with_schema(Arc::new(RowSchema::new(fields)), values))
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "]")
    }
}

/// Incremental builder for rows with a schema.
#[derive(Debug, Default)]
pub struct RowBuilder {
    fields: Vec<Field>,
    values: Vec<Value>,
}

impl RowBuilder {
    /// Appends a field and its value.
    pub fn field(mut self, name: impl Into<String>, data_type: DataType, value: impl Into<Value>) -> Self {
        self.fields.push(Field::nullable(name, data_type));
        self.values.push(value.into());
        self
    }

    /// Builds the row.
    pub fn build(self) -> Row {
        Row::with_schema(Arc::new(RowSchema::new(self.fields)), self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::builder()
            .field("id", DataType::Int64, 1i64)
            .field("name", DataType::String, "a")
            .field("note", DataType::String, Value::Null)
            .build()
    }

    #[test]
    fn test_lookup_by_name() {
        let row = sample();
        assert_eq!(row.get_by_name("id"), Some(&Value::Int64(1)));
        assert_eq!(row.get_by_name("missing"), None);
        assert!(row.is_null_at(2));
        assert!(!row.is_null_at(0));
        assert!(row.is_null_at(99));
    }

    #[test]
    fn test_field_value_without_schema() {
        let row = Row::new(vec![Value::Int64(1)]);
        assert_eq!(row.field_value("id"), Err(ModelError::MissingSchema));
    }

    #[test]
    fn test_without_field() {
        let row = sample().without_field("name");
        let schema = row.schema().unwrap();
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["id", "note"]);
        assert_eq!(row.values(), &[Value::Int64(1), Value::Null]);

        // Unknown names leave the row alone.
        assert_eq!(sample().without_field("zzz"), sample());
    }

    #[test]
    fn test_with_field_replaces_or_appends() {
        let row = sample()
            .with_field("name", DataType::String, Value::from("b"))
            .unwrap();
        assert_eq!(row.get_by_name("name"), Some(&Value::from("b")));
        assert_eq!(row.len(), 3);

        let row = row.with_field("extra", DataType::Boolean, Value::from(true)).unwrap();
        assert_eq!(row.len(), 4);
        assert_eq!(row.get(3), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_display() {
        let row = sample();
        assert_eq!(row.to_string(), "[1,a,null]");
        assert_eq!(
            row.schema().unwrap().to_string(),
            "struct<id:int64,name:string,note:string>"
        );
    }
}
