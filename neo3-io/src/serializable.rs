//! The trait implemented by every wire-format type.

use crate::binary_writer::BinaryWriter;
use crate::error::{IoError, IoResult};
use crate::memory_reader::MemoryReader;

/// A type with a canonical Neo wire representation.
pub trait Serializable: Sized {
    /// The serialized size in bytes.
    fn size(&self) -> usize;

    /// Writes this value to the writer.
    fn serialize(&self, writer: &mut BinaryWriter);

    /// Reads a value from the reader.
    fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self>;

    /// Serializes this value to a fresh byte vector.
    fn to_array(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(self.size());
        self.serialize(&mut writer);
        writer.into_bytes()
    }

    /// Deserializes a value from a byte slice, requiring that the whole
    /// input is consumed.
    fn from_bytes(bytes: &[u8]) -> IoResult<Self> {
        let mut reader = MemoryReader::new(bytes);
        let value = Self::deserialize(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(IoError::TrailingBytes {
                field: std::any::type_name::<Self>(),
                remaining: reader.remaining(),
            });
        }
        Ok(value)
    }

    /// Reads a varint-counted list of values, bounded by `max` items.
    fn deserialize_list(
        reader: &mut MemoryReader<'_>,
        field: &'static str,
        max: usize,
    ) -> IoResult<Vec<Self>> {
        let count = reader.read_var_int(field, max as u64)? as usize;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(Self::deserialize(reader)?);
        }
        Ok(items)
    }
}

/// The serialized size of a varint holding `value`.
pub fn var_size(value: u64) -> usize {
    if value < 0xfd {
        1
    } else if value <= 0xffff {
        3
    } else if value <= 0xffff_ffff {
        5
    } else {
        9
    }
}

/// The serialized size of a varbytes field holding `bytes`.
pub fn var_size_bytes(bytes: &[u8]) -> usize {
    var_size(bytes.len() as u64) + bytes.len()
}

/// The serialized size of a list of serializable items.
pub fn var_size_list<T: Serializable>(items: &[T]) -> usize {
    var_size(items.len() as u64) + items.iter().map(Serializable::size).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pair {
        a: u8,
        b: u32,
    }

    impl Serializable for Pair {
        fn size(&self) -> usize {
            5
        }

        fn serialize(&self, writer: &mut BinaryWriter) {
            writer.write_u8(self.a);
            writer.write_u32(self.b);
        }

        fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self> {
            Ok(Self {
                a: reader.read_u8("a")?,
                b: reader.read_u32("b")?,
            })
        }
    }

    #[test]
    fn round_trip_consumes_all_input() {
        let pair = Pair { a: 7, b: 0xdeadbeef };
        let bytes = pair.to_array();
        assert_eq!(bytes.len(), pair.size());
        assert_eq!(Pair::from_bytes(&bytes).unwrap(), pair);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = Pair { a: 7, b: 1 }.to_array();
        bytes.push(0xff);
        assert!(matches!(
            Pair::from_bytes(&bytes).unwrap_err(),
            IoError::TrailingBytes { remaining: 1, .. }
        ));
    }

    #[test]
    fn list_round_trip() {
        let items = vec![Pair { a: 1, b: 2 }, Pair { a: 3, b: 4 }];
        let mut writer = BinaryWriter::new();
        writer.write_serializable_list(&items);
        let bytes = writer.into_bytes();

        let mut reader = MemoryReader::new(&bytes);
        let parsed = Pair::deserialize_list(&mut reader, "pairs", 16).unwrap();
        assert_eq!(parsed, items);
    }

    #[test]
    fn var_size_matches_writer() {
        for value in [0u64, 0xfc, 0xfd, 0xffff, 0x1_0000, u64::MAX] {
            let mut writer = BinaryWriter::new();
            writer.write_var_int(value);
            assert_eq!(writer.len(), var_size(value), "value {value:#x}");
        }
    }
}
