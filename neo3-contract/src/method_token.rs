//! Method tokens: static references to other contracts' methods.

use neo3_io::{var_size_bytes, BinaryWriter, IoError, IoResult, MemoryReader, Serializable};
use neo3_types::hash160::HASH160_SIZE;
use neo3_types::Hash160;

use crate::call_flags::CallFlags;

/// Maximum byte length of a token's method name.
const MAX_METHOD_NAME_LEN: usize = 32;

/// A static call target referenced from a contract script via `CALLT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodToken {
    /// The called contract.
    pub hash: Hash160,
    /// The called method name.
    pub method: String,
    /// The number of parameters the call pushes.
    pub param_count: u16,
    /// Whether the called method returns a value.
    pub has_return: bool,
    /// The permissions granted to the call.
    pub call_flags: CallFlags,
}

impl Serializable for MethodToken {
    fn size(&self) -> usize {
        HASH160_SIZE + var_size_bytes(self.method.as_bytes()) + 2 + 1 + 1
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(self.hash.as_bytes());
        writer.write_var_string(&self.method);
        writer.write_u16(self.param_count);
        writer.write_bool(self.has_return);
        writer.write_u8(self.call_flags.byte());
    }

    fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self> {
        let hash_bytes = reader.read_bytes("token hash", HASH160_SIZE)?;
        let hash = Hash160::from_bytes(&hash_bytes)
            .map_err(|e| IoError::invalid_data("token hash", reader.position(), e.to_string()))?;
        let method = reader.read_var_string("token method", MAX_METHOD_NAME_LEN)?;
        let param_count = reader.read_u16("token param count")?;
        let has_return = reader.read_bool("token has-return flag")?;
        let flags_offset = reader.position();
        let flags_byte = reader.read_u8("token call flags")?;
        let call_flags = CallFlags::from_byte(flags_byte).ok_or_else(|| {
            IoError::unexpected_discriminant("token call flags", flags_offset, flags_byte)
        })?;
        Ok(Self {
            hash,
            method,
            param_count,
            has_return,
            call_flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn token() -> MethodToken {
        MethodToken {
            hash: Hash160::from_str("0xd2a4cff31913016155e38e474a2c06d08be276cf").unwrap(),
            method: "transfer".to_string(),
            param_count: 4,
            has_return: true,
            call_flags: CallFlags::ALL,
        }
    }

    #[test]
    fn round_trip() {
        let token = token();
        let bytes = token.to_array();
        assert_eq!(bytes.len(), token.size());
        assert_eq!(MethodToken::from_bytes(&bytes).unwrap(), token);
    }

    #[test]
    fn rejects_undefined_call_flags() {
        let mut bytes = token().to_array();
        let last = bytes.len() - 1;
        bytes[last] = 0x55;
        assert!(matches!(
            MethodToken::from_bytes(&bytes).unwrap_err(),
            IoError::UnexpectedDiscriminant { value: 0x55, .. }
        ));
    }
}
