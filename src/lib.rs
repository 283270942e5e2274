pub mod protocol;
pub mod utilities;

pub use protocol::types::error::{ProtocolError, SchemaError};
pub use protocol::{ApiKey, ByteBuffer, Field, Record, Schema, Type, Value};
