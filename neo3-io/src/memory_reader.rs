//! A positioned reader over an in-memory byte slice.

use crate::error::{IoError, IoResult};

/// Reads wire-format data from a byte slice, tracking the current offset.
///
/// Every read validates the remaining length first; failed reads leave the
/// position unchanged and report the field name and offset.
pub struct MemoryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> MemoryReader<'a> {
    /// Creates a reader over the given data, positioned at the start.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// The current offset into the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The total length of the underlying data.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the underlying data is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn ensure(&self, field: &'static str, count: usize) -> IoResult<()> {
        if self.pos + count > self.data.len() {
            return Err(IoError::end_of_stream(
                field,
                self.pos + count - self.data.len(),
                self.pos,
            ));
        }
        Ok(())
    }

    /// Peeks at the next byte without advancing.
    pub fn peek(&self, field: &'static str) -> IoResult<u8> {
        self.ensure(field, 1)?;
        Ok(self.data[self.pos])
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self, field: &'static str) -> IoResult<u8> {
        self.ensure(field, 1)?;
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    /// Reads a boolean encoded as `0x00` or `0x01`.
    pub fn read_bool(&mut self, field: &'static str) -> IoResult<bool> {
        let offset = self.pos;
        match self.read_u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(IoError::unexpected_discriminant(field, offset, value)),
        }
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16(&mut self, field: &'static str) -> IoResult<u16> {
        self.ensure(field, 2)?;
        let mut bytes = [0u8; 2];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 2]);
        self.pos += 2;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32(&mut self, field: &'static str) -> IoResult<u32> {
        self.ensure(field, 4)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Reads a little-endian `u64`.
    pub fn read_u64(&mut self, field: &'static str) -> IoResult<u64> {
        self.ensure(field, 8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Reads a little-endian `i64`.
    pub fn read_i64(&mut self, field: &'static str) -> IoResult<i64> {
        Ok(self.read_u64(field)? as i64)
    }

    /// Reads `count` raw bytes.
    pub fn read_bytes(&mut self, field: &'static str, count: usize) -> IoResult<Vec<u8>> {
        self.ensure(field, count)?;
        let out = self.data[self.pos..self.pos + count].to_vec();
        self.pos += count;
        Ok(out)
    }

    /// Reads a variable-length integer and validates it against `max`.
    ///
    /// Encoding: a value below `0xfd` fits in the prefix byte itself;
    /// `0xfd`, `0xfe`, and `0xff` announce a following `u16`, `u32`, or
    /// `u64` respectively.
    pub fn read_var_int(&mut self, field: &'static str, max: u64) -> IoResult<u64> {
        let offset = self.pos;
        let prefix = self.read_u8(field)?;
        let value = match prefix {
            0xfd => self.read_u16(field)? as u64,
            0xfe => self.read_u32(field)? as u64,
            0xff => self.read_u64(field)?,
            b => b as u64,
        };
        if value > max {
            return Err(IoError::exceeds_limit(field, offset, value, max));
        }
        Ok(value)
    }

    /// Reads a byte string with a varint length prefix, bounded by `max`.
    pub fn read_var_bytes(&mut self, field: &'static str, max: usize) -> IoResult<Vec<u8>> {
        let length = self.read_var_int(field, max as u64)? as usize;
        self.read_bytes(field, length)
    }

    /// Reads a UTF-8 string with a varint length prefix, bounded by `max`.
    pub fn read_var_string(&mut self, field: &'static str, max: usize) -> IoResult<String> {
        let offset = self.pos;
        let bytes = self.read_var_bytes(field, max)?;
        String::from_utf8(bytes)
            .map_err(|e| IoError::invalid_data(field, offset, format!("invalid UTF-8: {e}")))
    }

    /// Reads a fixed-width UTF-8 string padded with zeros to `width`.
    /// Non-zero bytes after the first zero are rejected.
    pub fn read_fixed_string(&mut self, field: &'static str, width: usize) -> IoResult<String> {
        let offset = self.pos;
        let bytes = self.read_bytes(field, width)?;
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(width);
        if bytes[end..].iter().any(|b| *b != 0) {
            return Err(IoError::invalid_data(
                field,
                offset,
                "non-zero bytes in fixed-string padding",
            ));
        }
        String::from_utf8(bytes[..end].to_vec())
            .map_err(|e| IoError::invalid_data(field, offset, format!("invalid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_integers() {
        let data = [0x78, 0x56, 0x34, 0x12];
        let mut reader = MemoryReader::new(&data);
        assert_eq!(reader.read_u32("value").unwrap(), 0x12345678);
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn var_int_forms() {
        let mut reader = MemoryReader::new(&[0x42]);
        assert_eq!(reader.read_var_int("n", u64::MAX).unwrap(), 0x42);

        let mut reader = MemoryReader::new(&[0xfd, 0x34, 0x12]);
        assert_eq!(reader.read_var_int("n", u64::MAX).unwrap(), 0x1234);

        let mut reader = MemoryReader::new(&[0xfe, 0x78, 0x56, 0x34, 0x12]);
        assert_eq!(reader.read_var_int("n", u64::MAX).unwrap(), 0x12345678);

        let mut reader = MemoryReader::new(&[0xff, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(reader.read_var_int("n", u64::MAX).unwrap(), 1);
    }

    #[test]
    fn var_int_respects_max() {
        let mut reader = MemoryReader::new(&[0xfd, 0x34, 0x12]);
        let err = reader.read_var_int("count", 16).unwrap_err();
        assert!(matches!(err, IoError::ExceedsLimit { max: 16, .. }));
    }

    #[test]
    fn truncated_read_reports_offset() {
        let mut reader = MemoryReader::new(&[0x01, 0x02]);
        reader.read_u8("first").unwrap();
        let err = reader.read_u32("second").unwrap_err();
        assert_eq!(
            err,
            IoError::end_of_stream("second", 3, 1)
        );
    }

    #[test]
    fn bool_rejects_other_values() {
        let mut reader = MemoryReader::new(&[0x02]);
        assert!(matches!(
            reader.read_bool("flag").unwrap_err(),
            IoError::UnexpectedDiscriminant { value: 0x02, .. }
        ));
    }

    #[test]
    fn fixed_string_rejects_dirty_padding() {
        let mut data = b"neo".to_vec();
        data.resize(8, 0);
        data[6] = 0x41;
        let mut reader = MemoryReader::new(&data);
        assert!(reader.read_fixed_string("compiler", 8).is_err());

        let mut data = b"neo".to_vec();
        data.resize(8, 0);
        let mut reader = MemoryReader::new(&data);
        assert_eq!(reader.read_fixed_string("compiler", 8).unwrap(), "neo");
    }

    #[test]
    fn var_string_reads_utf8() {
        let data = [0x05, b'h', b'e', b'l', b'l', b'o'];
        let mut reader = MemoryReader::new(&data);
        assert_eq!(reader.read_var_string("s", 100).unwrap(), "hello");
    }
}
