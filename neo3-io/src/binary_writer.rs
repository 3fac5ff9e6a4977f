//! A growable writer producing wire-format bytes.

use bytes::{BufMut, BytesMut};

use crate::serializable::Serializable;

/// Writes wire-format data into a growable buffer.
///
/// Writers are infallible for valid in-memory values; all validation
/// happens on the read side.
pub struct BinaryWriter {
    buffer: BytesMut,
}

impl BinaryWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Creates a writer with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// The number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.put_u8(value);
    }

    /// Writes a boolean as `0x00` / `0x01`.
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    /// Writes a little-endian `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.buffer.put_u16_le(value);
    }

    /// Writes a little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.put_u32_le(value);
    }

    /// Writes a little-endian `u64`.
    pub fn write_u64(&mut self, value: u64) {
        self.buffer.put_u64_le(value);
    }

    /// Writes a little-endian `i64`.
    pub fn write_i64(&mut self, value: i64) {
        self.buffer.put_i64_le(value);
    }

    /// Writes raw bytes without a length prefix.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.buffer.put_slice(value);
    }

    /// Writes a variable-length integer in its shortest form.
    pub fn write_var_int(&mut self, value: u64) {
        if value < 0xfd {
            self.write_u8(value as u8);
        } else if value <= 0xffff {
            self.write_u8(0xfd);
            self.write_u16(value as u16);
        } else if value <= 0xffff_ffff {
            self.write_u8(0xfe);
            self.write_u32(value as u32);
        } else {
            self.write_u8(0xff);
            self.write_u64(value);
        }
    }

    /// Writes bytes prefixed with their varint length.
    pub fn write_var_bytes(&mut self, value: &[u8]) {
        self.write_var_int(value.len() as u64);
        self.write_bytes(value);
    }

    /// Writes a UTF-8 string prefixed with its varint byte length.
    pub fn write_var_string(&mut self, value: &str) {
        self.write_var_bytes(value.as_bytes());
    }

    /// Writes a UTF-8 string zero-padded to `width` bytes.
    ///
    /// Panics if the string does not fit; callers validate the length at
    /// construction time (e.g. the NEF compiler field).
    pub fn write_fixed_string(&mut self, value: &str, width: usize) {
        let bytes = value.as_bytes();
        assert!(
            bytes.len() <= width,
            "fixed string of {} bytes exceeds width {width}",
            bytes.len()
        );
        self.write_bytes(bytes);
        for _ in bytes.len()..width {
            self.write_u8(0);
        }
    }

    /// Writes a serializable value.
    pub fn write_serializable<T: Serializable>(&mut self, value: &T) {
        value.serialize(self);
    }

    /// Writes a list as a varint count followed by each item.
    pub fn write_serializable_list<T: Serializable>(&mut self, items: &[T]) {
        self.write_var_int(items.len() as u64);
        for item in items {
            item.serialize(self);
        }
    }

    /// Consumes the writer, returning the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Copies out the bytes written so far.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.to_vec()
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}
