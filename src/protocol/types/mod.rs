//! Wire types and the schema/record engine.
//!
//! A [`Type`] knows how to read, write and size exactly one value shape. A
//! [`Schema`] is an ordered list of named [`Field`]s and is itself a `Type`,
//! so schemas nest inside schemas and arrays to any depth. Decoding through a
//! schema yields a [`Record`] whose [`Value`]s line up with the schema's
//! fields slot by slot.
//!
//! Serialization is schema-first: nothing on the wire says which type comes
//! next, so the reader must already hold the exact schema the writer used.
//!
//! # Example
//! ```rust
//! use wireform::{ByteBuffer, Field, Record, Schema, Type, Value};
//!
//! let broker = Schema::new(vec![
//!     Field::new("node_id", Type::Int32, "The broker id."),
//!     Field::new("host", Type::String, "The hostname of the broker."),
//!     Field::new("port", Type::Int32, "The port of the broker."),
//! ])
//! .unwrap();
//!
//! let record = Record::new(&broker, vec![5.into(), "broker1".into(), 9092.into()]).unwrap();
//! let mut buffer = ByteBuffer::allocate(broker.size_of(&record).unwrap());
//! broker.write(&mut buffer, &record).unwrap();
//!
//! buffer.rewind();
//! let decoded = broker.read(&mut buffer).unwrap();
//! assert_eq!(decoded.get_string("host"), Some("broker1"));
//! assert_eq!(decoded.find("port"), Some(&Value::Int32(9092)));
//! ```
use std::{fmt, sync::Arc};

pub mod buffer;
mod field;
mod record;
mod schema;
mod value;

pub use buffer::ByteBuffer;
pub use field::Field;
pub use record::Record;
pub use schema::Schema;
pub use value::Value;

use crate::utilities::{utf8_decode, utf8_encode};

use error::ProtocolError;
use header::*;

pub mod header {
    pub const INT8_SIZE: usize = size_of::<i8>();
    pub const INT16_SIZE: usize = size_of::<i16>();
    pub const INT32_SIZE: usize = size_of::<i32>();
    pub const INT64_SIZE: usize = size_of::<i64>();

    pub const STRING_LENGTH_SIZE: usize = size_of::<i16>();
    pub const BYTES_LENGTH_SIZE: usize = size_of::<i32>();
    pub const ARRAY_COUNT_SIZE: usize = size_of::<i32>();

    /// Length/count prefix marking an absent string, byte sequence or array.
    pub const NULL_LENGTH: i32 = -1;
}

pub mod error {
    use thiserror::Error;

    /// Raised while assembling a [`Schema`](super::Schema).
    #[derive(Debug, Error, Clone, PartialEq, Eq)]
    pub enum SchemaError {
        #[error("schema contains a duplicate field: {0}")]
        DuplicateField(String),

        #[error("field at slot {slot} has an empty name")]
        EmptyFieldName { slot: usize },
    }

    #[derive(Debug, Error, Clone, PartialEq, Eq)]
    pub enum ProtocolError {
        #[error("buffer underflow: {needed} bytes needed, {remaining} remaining")]
        BufferUnderflow { needed: usize, remaining: usize },

        #[error("buffer overflow: {needed} bytes needed, {remaining} remaining")]
        BufferOverflow { needed: usize, remaining: usize },

        #[error("[encoding][{what}]: {reason}")]
        Encoding { what: &'static str, reason: String },

        #[error("invalid {what} length {length}")]
        InvalidLength { what: &'static str, length: i64 },

        #[error("type mismatch: expected {expected}, found {found}")]
        TypeMismatch {
            expected: String,
            found: &'static str,
        },

        #[error("record shape mismatch: expected {expected}, found {found}")]
        Shape { expected: String, found: String },

        #[error("no field named '{0}'")]
        UnknownField(String),

        #[error(transparent)]
        Schema(#[from] SchemaError),
    }
}

/// The closed set of wire shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int8,
    Int16,
    Int32,
    Int64,
    /// i16 length then UTF-8 bytes; length -1 is [`Value::Null`].
    String,
    /// i32 length then raw bytes; length -1 is [`Value::Null`].
    Bytes,
    /// i32 count then each element; count -1 is [`Value::Null`].
    ArrayOf(Box<Type>),
    /// Each field in order, no prefix.
    Schema(Arc<Schema>),
}

impl Type {
    pub fn array_of(element: Type) -> Self {
        Type::ArrayOf(Box::new(element))
    }

    pub fn schema(schema: Schema) -> Self {
        Type::Schema(Arc::new(schema))
    }

    /// Nested schema of a `Schema` type, or of the elements of an array of schemas.
    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            Type::Schema(schema) => Some(schema.as_ref()),
            Type::ArrayOf(element) => element.as_schema(),
            _ => None,
        }
    }

    pub fn read<'a>(&'a self, buffer: &mut ByteBuffer) -> Result<Value<'a>, ProtocolError> {
        match self {
            Type::Int8 => Ok(Value::Int8(buffer.get_i8()?)),
            Type::Int16 => Ok(Value::Int16(buffer.get_i16()?)),
            Type::Int32 => Ok(Value::Int32(buffer.get_i32()?)),
            Type::Int64 => Ok(Value::Int64(buffer.get_i64()?)),
            Type::String => match length_prefix("string", buffer.get_i16()?.into())? {
                None => Ok(Value::Null),
                Some(len) => Ok(Value::String(utf8_decode(buffer.get_bytes(len)?)?)),
            },
            Type::Bytes => match length_prefix("bytes", buffer.get_i32()?.into())? {
                None => Ok(Value::Null),
                Some(len) => Ok(Value::Bytes(buffer.get_bytes(len)?.to_vec())),
            },
            Type::ArrayOf(element) => {
                let Some(count) = length_prefix("array", buffer.get_i32()?.into())? else {
                    return Ok(Value::Null);
                };

                // Reject counts that cannot fit before allocating for them.
                // Zero-width elements are charged one byte each so the count
                // stays bounded by the input.
                let needed = count.saturating_mul(element.min_size().max(1));
                if needed > buffer.remaining() {
                    return Err(ProtocolError::BufferUnderflow {
                        needed,
                        remaining: buffer.remaining(),
                    });
                }

                let mut items = Vec::with_capacity(count.min(buffer.remaining()));
                for _ in 0..count {
                    items.push(element.read(buffer)?);
                }
                Ok(Value::Array(items))
            }
            Type::Schema(schema) => Ok(Value::Record(schema.read(buffer)?)),
        }
    }

    pub fn write(&self, buffer: &mut ByteBuffer, value: &Value<'_>) -> Result<(), ProtocolError> {
        match (self, value) {
            (Type::Int8, Value::Int8(v)) => buffer.put_i8(*v),
            (Type::Int16, Value::Int16(v)) => buffer.put_i16(*v),
            (Type::Int32, Value::Int32(v)) => buffer.put_i32(*v),
            (Type::Int64, Value::Int64(v)) => buffer.put_i64(*v),
            (Type::String, Value::Null) => buffer.put_i16(NULL_LENGTH as i16),
            (Type::Bytes | Type::ArrayOf(_), Value::Null) => buffer.put_i32(NULL_LENGTH),
            (Type::String, Value::String(s)) => {
                let bytes = utf8_encode(s);
                buffer.put_i16(string_length(bytes.len())?)?;
                buffer.put_bytes(&bytes)
            }
            (Type::Bytes, Value::Bytes(bytes)) => {
                buffer.put_i32(count_prefix("bytes", bytes.len())?)?;
                buffer.put_bytes(bytes)
            }
            (Type::ArrayOf(element), Value::Array(items)) => {
                buffer.put_i32(count_prefix("array", items.len())?)?;
                items.iter().try_for_each(|item| element.write(buffer, item))
            }
            (Type::Schema(schema), Value::Record(record)) => schema.write(buffer, record),
            (ty, value) => Err(mismatch(ty, value)),
        }
    }

    /// Exact number of bytes [`Type::write`] produces for `value`.
    pub fn size_of(&self, value: &Value<'_>) -> Result<usize, ProtocolError> {
        match (self, value) {
            (Type::Int8, Value::Int8(_)) => Ok(INT8_SIZE),
            (Type::Int16, Value::Int16(_)) => Ok(INT16_SIZE),
            (Type::Int32, Value::Int32(_)) => Ok(INT32_SIZE),
            (Type::Int64, Value::Int64(_)) => Ok(INT64_SIZE),
            (Type::String, Value::Null) => Ok(STRING_LENGTH_SIZE),
            (Type::Bytes, Value::Null) => Ok(BYTES_LENGTH_SIZE),
            (Type::ArrayOf(_), Value::Null) => Ok(ARRAY_COUNT_SIZE),
            (Type::String, Value::String(s)) => {
                string_length(s.len())?;
                Ok(STRING_LENGTH_SIZE + s.len())
            }
            (Type::Bytes, Value::Bytes(bytes)) => {
                count_prefix("bytes", bytes.len())?;
                Ok(BYTES_LENGTH_SIZE + bytes.len())
            }
            (Type::ArrayOf(element), Value::Array(items)) => {
                count_prefix("array", items.len())?;
                items.iter().try_fold(ARRAY_COUNT_SIZE, |size, item| {
                    Ok(size + element.size_of(item)?)
                })
            }
            (Type::Schema(schema), Value::Record(record)) => schema.size_of(record),
            (ty, value) => Err(mismatch(ty, value)),
        }
    }

    /// Check that `value` belongs to this type's value domain, recursively.
    pub fn validate(&self, value: &Value<'_>) -> Result<(), ProtocolError> {
        match (self, value) {
            (Type::Int8, Value::Int8(_))
            | (Type::Int16, Value::Int16(_))
            | (Type::Int32, Value::Int32(_))
            | (Type::Int64, Value::Int64(_))
            | (Type::String, Value::String(_))
            | (Type::Bytes, Value::Bytes(_))
            | (Type::String | Type::Bytes | Type::ArrayOf(_), Value::Null) => Ok(()),
            (Type::ArrayOf(element), Value::Array(items)) => {
                items.iter().try_for_each(|item| element.validate(item))
            }
            (Type::Schema(schema), Value::Record(record)) => schema.check(record),
            (ty, value) => Err(mismatch(ty, value)),
        }
    }

    /// Smallest number of bytes any value of this type occupies on the wire.
    pub fn min_size(&self) -> usize {
        match self {
            Type::Int8 => INT8_SIZE,
            Type::Int16 => INT16_SIZE,
            Type::Int32 => INT32_SIZE,
            Type::Int64 => INT64_SIZE,
            Type::String => STRING_LENGTH_SIZE,
            Type::Bytes => BYTES_LENGTH_SIZE,
            Type::ArrayOf(_) => ARRAY_COUNT_SIZE,
            Type::Schema(schema) => schema.fields().map(|f| f.ty().min_size()).sum(),
        }
    }

    /// Value a freshly built record holds for this type: zero, absent, or a
    /// nested record of defaults.
    pub fn default_value(&self) -> Value<'_> {
        match self {
            Type::Int8 => Value::Int8(0),
            Type::Int16 => Value::Int16(0),
            Type::Int32 => Value::Int32(0),
            Type::Int64 => Value::Int64(0),
            Type::String | Type::Bytes | Type::ArrayOf(_) => Value::Null,
            Type::Schema(schema) => Value::Record(Record::with_defaults(schema)),
        }
    }

    /// Same wire layout, ignoring field names and documentation.
    pub fn is_compatible(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::ArrayOf(a), Type::ArrayOf(b)) => a.is_compatible(b),
            (Type::Schema(a), Type::Schema(b)) => a.is_compatible(b),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int8 => write!(f, "INT8"),
            Type::Int16 => write!(f, "INT16"),
            Type::Int32 => write!(f, "INT32"),
            Type::Int64 => write!(f, "INT64"),
            Type::String => write!(f, "STRING"),
            Type::Bytes => write!(f, "BYTES"),
            Type::ArrayOf(element) => write!(f, "ARRAY({element})"),
            Type::Schema(schema) => write!(f, "{schema}"),
        }
    }
}

fn mismatch(ty: &Type, value: &Value<'_>) -> ProtocolError {
    ProtocolError::TypeMismatch {
        expected: ty.to_string(),
        found: value.kind(),
    }
}

/// `None` for the absent marker, the payload length otherwise.
fn length_prefix(what: &'static str, length: i64) -> Result<Option<usize>, ProtocolError> {
    match length {
        l if l == NULL_LENGTH as i64 => Ok(None),
        l if l < 0 => Err(ProtocolError::InvalidLength { what, length: l }),
        l => usize::try_from(l)
            .map(Some)
            .map_err(|_| ProtocolError::InvalidLength { what, length: l }),
    }
}

fn string_length(len: usize) -> Result<i16, ProtocolError> {
    i16::try_from(len).map_err(|_| ProtocolError::Encoding {
        what: "string",
        reason: format!("{len} bytes exceeds the maximum of {}", i16::MAX),
    })
}

fn count_prefix(what: &'static str, len: usize) -> Result<i32, ProtocolError> {
    i32::try_from(len).map_err(|_| ProtocolError::Encoding {
        what,
        reason: format!("{len} entries exceeds the maximum of {}", i32::MAX),
    })
}
