//! Fixed-capacity byte buffer with a read/write cursor.
//!
//! Every primitive on the wire is big-endian. Relative `get_*`/`put_*` calls
//! advance the cursor; the `*_at` variants address an explicit index and leave
//! the cursor where it is.
use super::error::ProtocolError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteBuffer {
    buf: Vec<u8>,
    position: usize,
}

impl ByteBuffer {
    /// Zero-filled buffer of exactly `capacity` bytes, cursor at 0.
    pub fn allocate(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            position: 0,
        }
    }

    /// Buffer over already received bytes, cursor at 0.
    pub fn wrap(bytes: Vec<u8>) -> Self {
        Self {
            buf: bytes,
            position: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// # Panics
    /// If `position` is past the end of the buffer.
    pub fn set_position(&mut self, position: usize) {
        assert!(
            position <= self.buf.len(),
            "position {position} out of bounds for buffer of {} bytes",
            self.buf.len()
        );
        self.position = position;
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    fn take(&mut self, len: usize) -> Result<&[u8], ProtocolError> {
        if len > self.remaining() {
            return Err(ProtocolError::BufferUnderflow {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let start = self.position;
        self.position += len;
        Ok(&self.buf[start..start + len])
    }

    fn reserve(&mut self, len: usize) -> Result<&mut [u8], ProtocolError> {
        if len > self.remaining() {
            return Err(ProtocolError::BufferOverflow {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let start = self.position;
        self.position += len;
        Ok(&mut self.buf[start..start + len])
    }

    fn slice_at(&self, index: usize, len: usize) -> Result<&[u8], ProtocolError> {
        match index.checked_add(len) {
            Some(end) if end <= self.buf.len() => Ok(&self.buf[index..end]),
            _ => Err(ProtocolError::BufferUnderflow {
                needed: len,
                remaining: self.buf.len().saturating_sub(index),
            }),
        }
    }

    fn slice_at_mut(&mut self, index: usize, len: usize) -> Result<&mut [u8], ProtocolError> {
        match index.checked_add(len) {
            Some(end) if end <= self.buf.len() => Ok(&mut self.buf[index..end]),
            _ => Err(ProtocolError::BufferOverflow {
                needed: len,
                remaining: self.buf.len().saturating_sub(index),
            }),
        }
    }

    pub fn get_i8(&mut self) -> Result<i8, ProtocolError> {
        let bytes = self.take(size_of::<i8>())?;
        Ok(i8::from_be_bytes([bytes[0]]))
    }

    pub fn get_i16(&mut self) -> Result<i16, ProtocolError> {
        let bytes = self.take(size_of::<i16>())?;
        Ok(i16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn get_i32(&mut self) -> Result<i32, ProtocolError> {
        let mut out = [0; size_of::<i32>()];
        out.copy_from_slice(self.take(size_of::<i32>())?);
        Ok(i32::from_be_bytes(out))
    }

    pub fn get_i64(&mut self) -> Result<i64, ProtocolError> {
        let mut out = [0; size_of::<i64>()];
        out.copy_from_slice(self.take(size_of::<i64>())?);
        Ok(i64::from_be_bytes(out))
    }

    /// Read `len` raw bytes at the cursor.
    pub fn get_bytes(&mut self, len: usize) -> Result<&[u8], ProtocolError> {
        self.take(len)
    }

    pub fn get_i32_at(&self, index: usize) -> Result<i32, ProtocolError> {
        let mut out = [0; size_of::<i32>()];
        out.copy_from_slice(self.slice_at(index, size_of::<i32>())?);
        Ok(i32::from_be_bytes(out))
    }

    pub fn put_i8(&mut self, value: i8) -> Result<(), ProtocolError> {
        self.put_bytes(&value.to_be_bytes())
    }

    pub fn put_i16(&mut self, value: i16) -> Result<(), ProtocolError> {
        self.put_bytes(&value.to_be_bytes())
    }

    pub fn put_i32(&mut self, value: i32) -> Result<(), ProtocolError> {
        self.put_bytes(&value.to_be_bytes())
    }

    pub fn put_i64(&mut self, value: i64) -> Result<(), ProtocolError> {
        self.put_bytes(&value.to_be_bytes())
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.reserve(bytes.len())?.clone_from_slice(bytes);
        Ok(())
    }

    pub fn put_i32_at(&mut self, index: usize, value: i32) -> Result<(), ProtocolError> {
        self.slice_at_mut(index, size_of::<i32>())?
            .clone_from_slice(&value.to_be_bytes());
        Ok(())
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(value: Vec<u8>) -> Self {
        Self::wrap(value)
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(value: &[u8]) -> Self {
        Self::wrap(value.to_vec())
    }
}
