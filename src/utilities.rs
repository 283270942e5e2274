//! Leaf codecs shared by the wire types.
//!
//! Unsigned 32-bit integers travel as the bit pattern of a signed 32-bit
//! integer. Strings are always UTF-8.
use crate::protocol::types::{ByteBuffer, error::ProtocolError};

/// Read an unsigned integer at the cursor, advancing it by 4 bytes.
pub fn read_unsigned_int(buffer: &mut ByteBuffer) -> Result<u32, ProtocolError> {
    Ok(buffer.get_i32()? as u32)
}

/// Read an unsigned integer at `index` without moving the cursor.
pub fn read_unsigned_int_at(buffer: &ByteBuffer, index: usize) -> Result<u32, ProtocolError> {
    Ok(buffer.get_i32_at(index)? as u32)
}

/// Write `value` as a 4 byte unsigned integer. Overflow is ignored: only the
/// low 32 bits are written.
pub fn write_unsigned_int(buffer: &mut ByteBuffer, value: u64) -> Result<(), ProtocolError> {
    buffer.put_i32(truncate(value))
}

/// Write `value` as a 4 byte unsigned integer at `index` without moving the
/// cursor. Overflow is ignored.
pub fn write_unsigned_int_at(
    buffer: &mut ByteBuffer,
    index: usize,
    value: u64,
) -> Result<(), ProtocolError> {
    buffer.put_i32_at(index, truncate(value))
}

fn truncate(value: u64) -> i32 {
    (value & 0xffff_ffff) as u32 as i32
}

pub fn utf8_encode(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

pub fn utf8_decode(bytes: &[u8]) -> Result<String, ProtocolError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| ProtocolError::Encoding {
            what: "utf8 decode",
            reason: e.to_string(),
        })
}

/// CRC32 of the whole slice.
pub fn crc32(bytes: &[u8]) -> u32 {
    crc32_range(bytes, 0, bytes.len())
}

/// CRC32 of `size` bytes starting at `offset`.
///
/// # Panics
/// If the range is not inside `bytes`.
pub fn crc32_range(bytes: &[u8], offset: usize, size: usize) -> u32 {
    let end = match offset.checked_add(size) {
        Some(end) if end <= bytes.len() => end,
        _ => panic!(
            "range {offset}+{size} out of bounds for {} bytes",
            bytes.len()
        ),
    };
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&bytes[offset..end]);
    hasher.finalize()
}
