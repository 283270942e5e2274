use std::{fmt, ptr};

use super::{Field, Schema, Value, error::ProtocolError};

/// Values shaped by a [`Schema`], one per field, in slot order.
///
/// A record borrows the schema that shaped it; the schema outlives every
/// record built from it and never changes underneath them.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<'a> {
    schema: &'a Schema,
    values: Vec<Value<'a>>,
}

impl<'a> Record<'a> {
    /// Record for encoding: one value per field, checked against each
    /// field's type.
    pub fn new(schema: &'a Schema, values: Vec<Value<'a>>) -> Result<Self, ProtocolError> {
        if values.len() != schema.num_fields() {
            return Err(ProtocolError::Shape {
                expected: format!("{} values for {schema}", schema.num_fields()),
                found: format!("{} values", values.len()),
            });
        }
        for (field, value) in schema.fields().zip(&values) {
            field.ty().validate(value)?;
        }
        Ok(Self { schema, values })
    }

    /// Record holding each field type's default: zero for integers, absent
    /// for strings, bytes and arrays, nested defaults for schemas.
    pub fn with_defaults(schema: &'a Schema) -> Self {
        let values = schema.fields().map(|f| f.ty().default_value()).collect();
        Self { schema, values }
    }

    /// Values already known to match `schema`, as produced by decoding.
    pub(super) fn from_parts(schema: &'a Schema, values: Vec<Value<'a>>) -> Self {
        debug_assert_eq!(schema.num_fields(), values.len());
        Self { schema, values }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn values(&self) -> &[Value<'a>] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value<'a>> {
        self.values
    }

    /// Value at `slot`.
    ///
    /// # Panics
    /// If `slot` is out of range.
    pub fn get(&self, slot: usize) -> &Value<'a> {
        &self.values[slot]
    }

    pub fn find(&self, name: &str) -> Option<&Value<'a>> {
        self.schema.find(name).map(|field| &self.values[field.slot()])
    }

    /// Value addressed by a field of this record's schema.
    ///
    /// # Panics
    /// If `field` is unattached or belongs to a different schema.
    pub fn get_field(&self, field: &Field) -> &Value<'a> {
        let slot = field.slot();
        match self.schema.fields().nth(slot) {
            Some(own) if ptr::eq(own, field) => &self.values[slot],
            _ => panic!(
                "field '{}' does not belong to schema {}",
                field.name(),
                self.schema
            ),
        }
    }

    /// Replace the value of `name`, checking it against the field's type.
    pub fn set(&mut self, name: &str, value: impl Into<Value<'a>>) -> Result<(), ProtocolError> {
        let field = self
            .schema
            .find(name)
            .ok_or_else(|| ProtocolError::UnknownField(name.to_string()))?;
        let value = value.into();
        field.ty().validate(&value)?;
        self.values[field.slot()] = value;
        Ok(())
    }

    /// Builder-style [`Record::set`].
    pub fn with(mut self, name: &str, value: impl Into<Value<'a>>) -> Result<Self, ProtocolError> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Default record for the nested schema of `name`, whether the field is a
    /// schema or an array of schemas.
    pub fn instance(&self, name: &str) -> Result<Record<'a>, ProtocolError> {
        let field = self
            .schema
            .find(name)
            .ok_or_else(|| ProtocolError::UnknownField(name.to_string()))?;
        field
            .ty()
            .as_schema()
            .map(Record::with_defaults)
            .ok_or_else(|| ProtocolError::TypeMismatch {
                expected: "a nested schema".to_string(),
                found: "a primitive field",
            })
    }

    pub fn get_int8(&self, name: &str) -> Option<i8> {
        self.find(name).and_then(Value::as_i8)
    }

    pub fn get_int16(&self, name: &str) -> Option<i16> {
        self.find(name).and_then(Value::as_i16)
    }

    pub fn get_int32(&self, name: &str) -> Option<i32> {
        self.find(name).and_then(Value::as_i32)
    }

    pub fn get_int64(&self, name: &str) -> Option<i64> {
        self.find(name).and_then(Value::as_i64)
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(Value::as_str)
    }

    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        self.find(name).and_then(Value::as_bytes)
    }

    pub fn get_array(&self, name: &str) -> Option<&[Value<'a>]> {
        self.find(name).and_then(Value::as_array)
    }

    pub fn get_record(&self, name: &str) -> Option<&Record<'a>> {
        self.find(name).and_then(Value::as_record)
    }
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (field, value)) in self.schema.fields().zip(&self.values).enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", field.name(), value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::Type;

    fn partition() -> Schema {
        Schema::new(vec![
            Field::new("partition", Type::Int32, ""),
            Field::new("error_code", Type::Int16, ""),
            Field::new("offset", Type::Int64, ""),
        ])
        .unwrap()
    }

    fn topic() -> Schema {
        Schema::new(vec![
            Field::new("topic_name", Type::String, ""),
            Field::new("partitions", Type::array_of(Type::schema(partition())), ""),
            Field::new("leader", Type::schema(partition()), ""),
        ])
        .unwrap()
    }

    #[test]
    fn arity_checked() {
        let schema = partition();
        let err = Record::new(&schema, vec![1.into()]).unwrap_err();
        assert!(matches!(err, ProtocolError::Shape { .. }));
    }

    #[test]
    fn types_checked() {
        let schema = partition();
        let err = Record::new(&schema, vec![1.into(), 2.into(), 3i64.into()]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::TypeMismatch {
                expected: "INT16".into(),
                found: "INT32"
            }
        );
    }

    #[test]
    fn null_only_for_nullable_types() {
        let schema = topic();
        let mut record = Record::with_defaults(&schema);
        assert!(record.set("topic_name", Value::Null).is_ok());
        assert!(record.set("partitions", Value::Null).is_ok());
        assert!(record.set("leader", Value::Null).is_err());
    }

    #[test]
    fn defaults() {
        let schema = topic();
        let record = Record::with_defaults(&schema);
        assert_eq!(record.find("topic_name"), Some(&Value::Null));
        assert_eq!(record.find("partitions"), Some(&Value::Null));
        let leader = record.get_record("leader").unwrap();
        assert_eq!(leader.get_int64("offset"), Some(0));
        assert_eq!(
            record.to_string(),
            "{topic_name=null,partitions=null,leader={partition=0,error_code=0,offset=0}}"
        );
    }

    #[test]
    fn set_and_lookup() {
        let schema = partition();
        let record = Record::with_defaults(&schema)
            .with("partition", 3)
            .unwrap()
            .with("offset", 42i64)
            .unwrap();

        assert_eq!(record.get(0), &Value::Int32(3));
        assert_eq!(record.get_int64("offset"), Some(42));
        assert_eq!(record.get_field(schema.get(1)), &Value::Int16(0));
        assert_eq!(record.find("missing"), None);
        assert_eq!(record.get_int32("offset"), None);
    }

    #[test]
    fn set_unknown_field() {
        let schema = partition();
        let mut record = Record::with_defaults(&schema);
        assert_eq!(
            record.set("nope", 1).unwrap_err(),
            ProtocolError::UnknownField("nope".into())
        );
    }

    #[test]
    fn instance_of_nested_schema() {
        let schema = topic();
        let record = Record::with_defaults(&schema);

        let element = record
            .instance("partitions")
            .unwrap()
            .with("partition", 9)
            .unwrap();
        let leader = record.instance("leader").unwrap();
        assert_eq!(element.schema().num_fields(), 3);
        assert_eq!(leader.get_int32("partition"), Some(0));
        assert!(record.instance("topic_name").is_err());

        let record = record
            .with("topic_name", "events")
            .unwrap()
            .with("partitions", vec![Value::from(element)])
            .unwrap();
        let bytes = schema.to_bytes(&record).unwrap();
        assert_eq!(schema.from_bytes(&bytes).unwrap(), record);
    }

    #[test]
    fn record_of_unrelated_schema_rejected() {
        let schema = topic();
        let other = Schema::new(vec![Field::new("x", Type::Int8, "")]).unwrap();
        let mut record = Record::with_defaults(&schema);
        let err = record.set("leader", Record::with_defaults(&other)).unwrap_err();
        assert!(matches!(err, ProtocolError::Shape { .. }));
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn lookup_through_same_named_foreign_field() {
        let schema = partition();
        let twin = partition();
        let record = Record::with_defaults(&schema);
        record.get_field(twin.get(0));
    }

    #[test]
    #[should_panic(expected = "is not attached")]
    fn lookup_through_unattached_field() {
        let schema = partition();
        let record = Record::with_defaults(&schema);
        record.get_field(&Field::new("partition", Type::Int32, ""));
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn lookup_through_foreign_field() {
        let schema = partition();
        let other = Schema::new(vec![Field::new("x", Type::Int32, "")]).unwrap();
        let record = Record::with_defaults(&schema);
        record.get_field(other.get(0));
    }
}
