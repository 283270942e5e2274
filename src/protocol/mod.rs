//! Request/response wire protocol.
//!
//! This module gives every request and response message a byte-exact layout
//! without hand-written per-message encoders. Messages are described as
//! [`Schema`]s built from a handful of wire [`Type`]s; the same schema encodes
//! a [`Record`] into bytes and decodes bytes back into a `Record`.
//!
//! # Overview
//!
//! A caller picks the schema for a message, builds a record matching it, asks
//! the schema for the record's size, allocates one [`ByteBuffer`] of exactly
//! that size and writes into it. The receiver reads the same schema back out
//! of the bytes and addresses fields by name or slot.
//!
//! # Key Components
//!
//! - [`types`]: The wire types, fields, schemas and records.
//! - [`catalogue`]: Headers and the request/response schemas per [`ApiKey`].
//!
//! # Binary Format
//!
//! All integers are big-endian two's-complement.
//!
//! - `INT8`/`INT16`/`INT32`/`INT64`: fixed width.
//! - `STRING`: i16 length then UTF-8 bytes.
//! - `BYTES`: i32 length then raw bytes.
//! - `ARRAY(T)`: i32 count then each element.
//! - Schemas: each field in declared order, no delimiters.
//!
//! A length or count of -1 marks an absent value.
//!
//! # See Also
//!
//! - [`utilities`](crate::utilities): Leaf codecs the wire types call into.
pub mod catalogue;
pub mod types;

pub use catalogue::{ApiKey, request_schema, response_schema};
pub use types::{ByteBuffer, Field, Record, Schema, Type, Value};
