//! Invocation scripts: the signature half of a witness.

use neo3_io::{var_size_bytes, BinaryWriter, IoResult, MemoryReader, Serializable};
use neo3_types::{ECKeyPair, TypeError, SIGNATURE_SIZE};

use crate::error::{ScriptError, ScriptResult};
use crate::script_builder::ScriptBuilder;

/// Maximum byte length accepted when deserializing an invocation script.
const MAX_INVOCATION_SCRIPT_LEN: usize = 1024;

/// The invocation half of a witness: zero or more signature pushes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationScript {
    script: Vec<u8>,
}

impl InvocationScript {
    /// An empty invocation script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps raw script bytes.
    pub fn from_bytes_raw(script: Vec<u8>) -> Self {
        Self { script }
    }

    /// Builds the script pushing a single 64-byte signature.
    pub fn from_signature(signature: &[u8]) -> ScriptResult<Self> {
        if signature.len() != SIGNATURE_SIZE {
            return Err(ScriptError::InvalidSignatureLength {
                actual: signature.len(),
            });
        }
        let mut builder = ScriptBuilder::new();
        builder.push_data(signature);
        Ok(Self {
            script: builder.into_bytes(),
        })
    }

    /// Signs `message` with the key pair and builds the signature push.
    pub fn from_message_and_key_pair(
        message: &[u8],
        key_pair: &ECKeyPair,
    ) -> Result<Self, TypeError> {
        let signature = key_pair.sign_message(message)?;
        let mut builder = ScriptBuilder::new();
        builder.push_data(&signature);
        Ok(Self {
            script: builder.into_bytes(),
        })
    }

    /// Builds the script pushing several signatures, in the given order.
    pub fn from_signatures(signatures: &[Vec<u8>]) -> ScriptResult<Self> {
        let mut builder = ScriptBuilder::new();
        for signature in signatures {
            if signature.len() != SIGNATURE_SIZE {
                return Err(ScriptError::InvalidSignatureLength {
                    actual: signature.len(),
                });
            }
            builder.push_data(signature);
        }
        Ok(Self {
            script: builder.into_bytes(),
        })
    }

    /// The raw script bytes.
    pub fn script(&self) -> &[u8] {
        &self.script
    }

    /// Whether the script is empty.
    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl Serializable for InvocationScript {
    fn size(&self) -> usize {
        var_size_bytes(&self.script)
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_var_bytes(&self.script);
    }

    fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self> {
        let script = reader.read_var_bytes("invocation script", MAX_INVOCATION_SCRIPT_LEN)?;
        Ok(Self { script })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_signature_push() {
        let signature = vec![0x11; 64];
        let script = InvocationScript::from_signature(&signature).unwrap();
        let bytes = script.script();
        assert_eq!(bytes[0], 0x0c); // PUSHDATA1
        assert_eq!(bytes[1], 64);
        assert_eq!(&bytes[2..], signature.as_slice());
    }

    #[test]
    fn rejects_wrong_signature_length() {
        assert!(InvocationScript::from_signature(&[0u8; 63]).is_err());
    }

    #[test]
    fn serialized_size_includes_length_prefix() {
        let script = InvocationScript::from_signature(&[0x22; 64]).unwrap();
        assert_eq!(script.size(), 1 + 66);
    }

    #[test]
    fn round_trip() {
        let script = InvocationScript::from_signatures(&[vec![0x33; 64], vec![0x44; 64]]).unwrap();
        let bytes = script.to_array();
        assert_eq!(InvocationScript::from_bytes(&bytes).unwrap(), script);
    }
}
