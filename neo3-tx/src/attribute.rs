//! Transaction attributes.

use neo3_io::{var_size_bytes, BinaryWriter, IoError, IoResult, MemoryReader, Serializable};

/// Maximum byte length of an oracle response payload.
const MAX_ORACLE_RESULT_LEN: usize = 0xffff;

/// The response outcome of an oracle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OracleResponseCode {
    Success = 0x00,
    ProtocolNotSupported = 0x10,
    ConsensusUnreachable = 0x12,
    NotFound = 0x14,
    Timeout = 0x16,
    Forbidden = 0x18,
    ResponseTooLarge = 0x1a,
    InsufficientFunds = 0x1c,
    ContentTypeNotSupported = 0x1f,
    Error = 0xff,
}

impl OracleResponseCode {
    pub fn byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Success),
            0x10 => Some(Self::ProtocolNotSupported),
            0x12 => Some(Self::ConsensusUnreachable),
            0x14 => Some(Self::NotFound),
            0x16 => Some(Self::Timeout),
            0x18 => Some(Self::Forbidden),
            0x1a => Some(Self::ResponseTooLarge),
            0x1c => Some(Self::InsufficientFunds),
            0x1f => Some(Self::ContentTypeNotSupported),
            0xff => Some(Self::Error),
            _ => None,
        }
    }
}

/// An attribute attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionAttribute {
    /// Prioritizes the transaction; only committee senders may use it.
    HighPriority,
    /// The response to an oracle request.
    OracleResponse {
        /// The oracle request id.
        id: u64,
        /// The response outcome.
        code: OracleResponseCode,
        /// The response payload.
        result: Vec<u8>,
    },
}

impl TransactionAttribute {
    pub const HIGH_PRIORITY_TYPE: u8 = 0x01;
    pub const ORACLE_RESPONSE_TYPE: u8 = 0x11;

    /// The attribute's wire discriminant.
    pub fn type_byte(&self) -> u8 {
        match self {
            Self::HighPriority => Self::HIGH_PRIORITY_TYPE,
            Self::OracleResponse { .. } => Self::ORACLE_RESPONSE_TYPE,
        }
    }

    /// Whether this is the `HighPriority` attribute.
    pub fn is_high_priority(&self) -> bool {
        matches!(self, Self::HighPriority)
    }
}

impl Serializable for TransactionAttribute {
    fn size(&self) -> usize {
        1 + match self {
            Self::HighPriority => 0,
            Self::OracleResponse { result, .. } => 8 + 1 + var_size_bytes(result),
        }
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.type_byte());
        if let Self::OracleResponse { id, code, result } = self {
            writer.write_u64(*id);
            writer.write_u8(code.byte());
            writer.write_var_bytes(result);
        }
    }

    fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self> {
        let offset = reader.position();
        let type_byte = reader.read_u8("attribute type")?;
        match type_byte {
            Self::HIGH_PRIORITY_TYPE => Ok(Self::HighPriority),
            Self::ORACLE_RESPONSE_TYPE => {
                let id = reader.read_u64("oracle response id")?;
                let code_offset = reader.position();
                let code_byte = reader.read_u8("oracle response code")?;
                let code = OracleResponseCode::from_byte(code_byte).ok_or_else(|| {
                    IoError::unexpected_discriminant("oracle response code", code_offset, code_byte)
                })?;
                let result = reader.read_var_bytes("oracle response result", MAX_ORACLE_RESULT_LEN)?;
                Ok(Self::OracleResponse { id, code, result })
            }
            other => Err(IoError::unexpected_discriminant(
                "attribute type",
                offset,
                other,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_priority_is_a_single_byte() {
        let attr = TransactionAttribute::HighPriority;
        assert_eq!(attr.to_array(), vec![0x01]);
        assert_eq!(
            TransactionAttribute::from_bytes(&[0x01]).unwrap(),
            TransactionAttribute::HighPriority
        );
    }

    #[test]
    fn oracle_response_round_trip() {
        let attr = TransactionAttribute::OracleResponse {
            id: 42,
            code: OracleResponseCode::Success,
            result: b"\"price\": 5".to_vec(),
        };
        let bytes = attr.to_array();
        assert_eq!(bytes.len(), attr.size());
        assert_eq!(TransactionAttribute::from_bytes(&bytes).unwrap(), attr);
    }

    #[test]
    fn unknown_attribute_type_is_rejected() {
        assert!(matches!(
            TransactionAttribute::from_bytes(&[0x02]).unwrap_err(),
            IoError::UnexpectedDiscriminant { value: 0x02, .. }
        ));
    }

    #[test]
    fn unknown_oracle_code_is_rejected() {
        let mut bytes = vec![0x11];
        bytes.extend_from_slice(&42u64.to_le_bytes());
        bytes.push(0x42);
        bytes.push(0x00);
        assert!(TransactionAttribute::from_bytes(&bytes).is_err());
    }
}
