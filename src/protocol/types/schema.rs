use std::{collections::HashMap, fmt, ptr};

use log::trace;

use super::{
    ByteBuffer, Field, Record,
    error::{ProtocolError, SchemaError},
};

/// Ordered, name-unique list of fields describing one compound value.
///
/// Field order is both the wire order and the slot order of every [`Record`]
/// built from the schema. A schema never changes after construction, so it
/// can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
    by_name: HashMap<String, usize>,
}

impl Schema {
    /// Adopt `fields` in order, assigning slots `0..n`.
    pub fn new<I>(fields: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = Field>,
    {
        let mut out: Vec<Field> = Vec::new();
        let mut by_name = HashMap::new();

        for (slot, field) in fields.into_iter().enumerate() {
            if field.name().is_empty() {
                return Err(SchemaError::EmptyFieldName { slot });
            }
            if by_name.contains_key(field.name()) {
                return Err(SchemaError::DuplicateField(field.name().to_string()));
            }
            by_name.insert(field.name().to_string(), slot);
            out.push(field.attach(slot));
        }

        Ok(Self {
            fields: out,
            by_name,
        })
    }

    pub fn read<'a>(&'a self, buffer: &mut ByteBuffer) -> Result<Record<'a>, ProtocolError> {
        trace!(
            "reading {} fields at position {}",
            self.fields.len(),
            buffer.position()
        );
        let values = self
            .fields
            .iter()
            .map(|field| field.read(buffer))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Record::from_parts(self, values))
    }

    pub fn write(&self, buffer: &mut ByteBuffer, record: &Record<'_>) -> Result<(), ProtocolError> {
        self.check(record)?;
        trace!(
            "writing {} fields at position {}",
            self.fields.len(),
            buffer.position()
        );
        for (field, value) in self.fields.iter().zip(record.values()) {
            field.write(buffer, value)?;
        }
        Ok(())
    }

    /// Exact number of bytes [`Schema::write`] produces for `record`.
    pub fn size_of(&self, record: &Record<'_>) -> Result<usize, ProtocolError> {
        self.check(record)?;
        self.fields
            .iter()
            .zip(record.values())
            .try_fold(0, |size, (field, value)| Ok(size + field.ty().size_of(value)?))
    }

    /// Size, allocate and write `record` in one go.
    pub fn to_bytes(&self, record: &Record<'_>) -> Result<Vec<u8>, ProtocolError> {
        let mut buffer = ByteBuffer::allocate(self.size_of(record)?);
        self.write(&mut buffer, record)?;
        debug_assert_eq!(buffer.remaining(), 0, "size_of disagrees with write");
        Ok(buffer.into_inner())
    }

    /// Decode one record from the front of `bytes`; trailing bytes are ignored.
    pub fn from_bytes<'a>(&'a self, bytes: &[u8]) -> Result<Record<'a>, ProtocolError> {
        self.read(&mut ByteBuffer::from(bytes))
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Field at `slot`.
    ///
    /// # Panics
    /// If `slot` is out of range.
    pub fn get(&self, slot: usize) -> &Field {
        &self.fields[slot]
    }

    /// Field named `name`, if the schema has one.
    pub fn find(&self, name: &str) -> Option<&Field> {
        self.by_name.get(name).map(|&slot| &self.fields[slot])
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Same field count with compatible types slot by slot.
    pub fn is_compatible(&self, other: &Schema) -> bool {
        ptr::eq(self, other)
            || (self.fields.len() == other.fields.len()
                && self
                    .fields
                    .iter()
                    .zip(&other.fields)
                    .all(|(a, b)| a.ty().is_compatible(b.ty())))
    }

    /// Reject records shaped by an incompatible schema.
    pub(super) fn check(&self, record: &Record<'_>) -> Result<(), ProtocolError> {
        if self.is_compatible(record.schema()) {
            Ok(())
        } else {
            Err(ProtocolError::Shape {
                expected: self.to_string(),
                found: record.schema().to_string(),
            })
        }
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:{}", field.name(), field.ty())?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;
    use crate::protocol::types::{Type, Value};

    fn broker() -> Schema {
        Schema::new(vec![
            Field::new("node_id", Type::Int32, "The broker id."),
            Field::new("host", Type::String, "The hostname of the broker."),
            Field::new("port", Type::Int32, "The port of the broker."),
        ])
        .unwrap()
    }

    #[test]
    fn broker_record_is_seventeen_bytes() {
        let schema = broker();
        let record = Record::new(&schema, vec![5.into(), "broker1".into(), 9092.into()]).unwrap();
        assert_eq!(schema.size_of(&record).unwrap(), 4 + (2 + 7) + 4);

        let bytes = schema.to_bytes(&record).unwrap();
        assert_eq!(bytes.len(), 17);
        assert_eq!(&bytes[..6], &[0, 0, 0, 5, 0, 7]);
        assert_eq!(&bytes[6..13], b"broker1");
        assert_eq!(&bytes[13..], &[0, 0, 0x23, 0x84]);

        let mut buffer = ByteBuffer::wrap(bytes);
        let decoded = schema.read(&mut buffer).unwrap();
        assert_eq!(buffer.position(), 17);
        assert_eq!(decoded, record);
        assert_eq!(decoded.get_int32("node_id"), Some(5));
        assert_eq!(decoded.get_string("host"), Some("broker1"));
        assert_eq!(decoded.get_int32("port"), Some(9092));
    }

    #[test]
    fn duplicate_field_rejected() {
        let orders = [
            vec![
                Field::new("a", Type::Int8, ""),
                Field::new("a", Type::String, ""),
            ],
            vec![
                Field::new("a", Type::Int8, ""),
                Field::new("b", Type::Int8, ""),
                Field::new("a", Type::Int8, ""),
            ],
        ];

        for fields in orders {
            assert_eq!(
                Schema::new(fields).unwrap_err(),
                SchemaError::DuplicateField("a".into())
            );
        }
    }

    #[test]
    fn empty_name_rejected() {
        let err = Schema::new(vec![
            Field::new("a", Type::Int8, ""),
            Field::new("", Type::Int8, ""),
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::EmptyFieldName { slot: 1 });
    }

    #[test]
    fn empty_schema() {
        let schema = Schema::new(Vec::new()).unwrap();
        let record = Record::new(&schema, vec![]).unwrap();
        assert_eq!(schema.num_fields(), 0);
        assert_eq!(schema.size_of(&record).unwrap(), 0);
        assert!(schema.to_bytes(&record).unwrap().is_empty());
    }

    #[test]
    fn slots_follow_input_order() {
        let schema = broker();
        let names: Vec<&str> = schema.fields().map(Field::name).collect();
        assert_eq!(names, vec!["node_id", "host", "port"]);

        for i in 0..schema.num_fields() {
            let field = schema.get(i);
            assert_eq!(field.index(), Some(i));
            assert_eq!(schema.find(field.name()).unwrap().name(), field.name());
        }
    }

    #[test]
    fn adopting_copies_fields() {
        let first = broker();
        let second = Schema::new(vec![first.get(2).clone(), first.get(0).clone()]).unwrap();
        assert_eq!(second.get(0).name(), "port");
        assert_eq!(second.get(0).index(), Some(0));
        assert_eq!(first.get(2).index(), Some(2));
    }

    #[test]
    fn unknown_name_is_absent() {
        assert!(broker().find("rack").is_none());
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn slot_out_of_range() {
        broker().get(3);
    }

    #[test]
    fn write_rejects_foreign_record() {
        let schema = broker();
        let other = Schema::new(vec![Field::new("id", Type::Int64, "")]).unwrap();
        let record = Record::new(&other, vec![Value::Int64(1)]).unwrap();

        let mut buffer = ByteBuffer::allocate(64);
        assert!(matches!(
            schema.write(&mut buffer, &record),
            Err(ProtocolError::Shape { .. })
        ));
        assert!(matches!(
            schema.size_of(&record),
            Err(ProtocolError::Shape { .. })
        ));
    }

    #[test]
    fn compatible_schema_may_write() {
        let schema = broker();
        let renamed = Schema::new(vec![
            Field::new("id", Type::Int32, ""),
            Field::new("hostname", Type::String, ""),
            Field::new("listener_port", Type::Int32, ""),
        ])
        .unwrap();
        let record = Record::new(&renamed, vec![1.into(), "h".into(), 2.into()]).unwrap();

        assert_eq!(schema.to_bytes(&record).unwrap(), renamed.to_bytes(&record).unwrap());
    }

    #[test]
    fn truncated_input_underflows() {
        let schema = broker();
        let record = Record::new(&schema, vec![5.into(), "broker1".into(), 9092.into()]).unwrap();
        let bytes = schema.to_bytes(&record).unwrap();

        assert!(matches!(
            schema.from_bytes(&bytes[..15]),
            Err(ProtocolError::BufferUnderflow { .. })
        ));
    }

    #[test]
    fn display_lists_fields() {
        assert_eq!(broker().to_string(), "{node_id:INT32,host:STRING,port:INT32}");
    }

    #[test]
    fn nested_array_of_schema_round_trips() {
        let inner = Arc::new(
            Schema::new(vec![
                Field::new("id", Type::Int32, ""),
                Field::new("replicas", Type::array_of(Type::Int32), ""),
            ])
            .unwrap(),
        );
        let outer = Schema::new(vec![
            Field::new("name", Type::String, ""),
            Field::new("items", Type::array_of(Type::Schema(Arc::clone(&inner))), ""),
        ])
        .unwrap();

        for len in [0usize, 1, 5] {
            let items = (0..len)
                .map(|i| {
                    let replicas = (0..i as i32).map(Value::Int32).collect::<Vec<_>>();
                    Record::new(&inner, vec![(i as i32).into(), Value::Array(replicas)])
                        .unwrap()
                        .into()
                })
                .collect::<Vec<Value>>();
            let record = Record::new(&outer, vec!["topic".into(), Value::Array(items)]).unwrap();

            let size = outer.size_of(&record).unwrap();
            let bytes = outer.to_bytes(&record).unwrap();
            assert_eq!(bytes.len(), size);

            let mut buffer = ByteBuffer::wrap(bytes);
            let decoded = outer.read(&mut buffer).unwrap();
            assert_eq!(buffer.position(), size);
            assert_eq!(decoded, record);
            assert_eq!(decoded.get_array("items").unwrap().len(), len);
        }
    }

    #[test]
    fn shared_between_threads() {
        let schema = Arc::new(broker());

        thread::scope(|s| {
            for id in 0..4 {
                let schema = Arc::clone(&schema);
                s.spawn(move || {
                    let record =
                        Record::new(&schema, vec![id.into(), "host".into(), 1.into()]).unwrap();
                    let bytes = schema.to_bytes(&record).unwrap();
                    let decoded = schema.from_bytes(&bytes).unwrap();
                    assert_eq!(decoded.get_int32("node_id"), Some(id));
                });
            }
        });
    }
}
