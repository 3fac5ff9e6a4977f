//! Witnesses: the proof half of a signer declaration.

use neo3_io::{BinaryWriter, IoResult, MemoryReader, Serializable};
use neo3_script::{InvocationScript, ScriptBuilder, VerificationScript};
use neo3_types::{ContractParameter, ECKeyPair, ECPublicKey, SIGNATURE_SIZE};

use crate::error::{TransactionError, TransactionResult};

/// An (invocation, verification) script pair proving a signer's intent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Witness {
    pub invocation: InvocationScript,
    pub verification: VerificationScript,
}

impl Witness {
    /// Wraps an existing script pair.
    pub fn new(invocation: InvocationScript, verification: VerificationScript) -> Self {
        Self {
            invocation,
            verification,
        }
    }

    /// Signs `message` with the key pair and pairs the signature push
    /// with the key's canonical verification script.
    pub fn create(message: &[u8], key_pair: &ECKeyPair) -> TransactionResult<Self> {
        let invocation = InvocationScript::from_message_and_key_pair(message, key_pair)?;
        let verification = VerificationScript::from_public_key(key_pair.public_key());
        Ok(Self {
            invocation,
            verification,
        })
    }

    /// Assembles a multi-sig witness from per-key signatures.
    ///
    /// The verification script dictates the key order; the first `m`
    /// available signatures are taken in that order. Fewer than `m`
    /// signatures fail with [`TransactionError::InsufficientSignatures`].
    pub fn create_multi_sig_witness(
        verification: VerificationScript,
        signatures: &[(ECPublicKey, Vec<u8>)],
    ) -> TransactionResult<Self> {
        let threshold = verification.signing_threshold()?;
        let keys = verification.public_keys()?;

        let mut ordered = Vec::with_capacity(threshold);
        for key in &keys {
            if let Some((_, signature)) = signatures.iter().find(|(k, _)| k == key) {
                ordered.push(signature.clone());
                if ordered.len() == threshold {
                    break;
                }
            }
        }
        if ordered.len() < threshold {
            return Err(TransactionError::InsufficientSignatures {
                required: threshold,
                provided: ordered.len(),
            });
        }
        let invocation = InvocationScript::from_signatures(&ordered)?;
        Ok(Self {
            invocation,
            verification,
        })
    }

    /// Builds the witness of a contract signer: the caller-supplied
    /// parameter pushes as invocation script and no verification script.
    pub fn contract_witness(params: &[ContractParameter]) -> TransactionResult<Self> {
        let mut builder = ScriptBuilder::new();
        for param in params {
            builder.push_param(param)?;
        }
        Ok(Self {
            invocation: InvocationScript::from_bytes_raw(builder.into_bytes()),
            verification: VerificationScript::new(),
        })
    }

    /// Builds a correctly sized placeholder witness for network-fee
    /// estimation: `m` zeroed signature pushes over the real script.
    pub fn dummy_witness(verification: VerificationScript) -> TransactionResult<Self> {
        let threshold = verification.signing_threshold()?;
        let zero_signatures = vec![vec![0u8; SIGNATURE_SIZE]; threshold];
        let invocation = InvocationScript::from_signatures(&zero_signatures)?;
        Ok(Self {
            invocation,
            verification,
        })
    }
}

impl Serializable for Witness {
    fn size(&self) -> usize {
        self.invocation.size() + self.verification.size()
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        self.invocation.serialize(writer);
        self.verification.serialize(writer);
    }

    fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self> {
        Ok(Self {
            invocation: InvocationScript::deserialize(reader)?,
            verification: VerificationScript::deserialize(reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_pair(fill: u8) -> ECKeyPair {
        let mut bytes = [fill; 32];
        bytes[0] = 0x01;
        ECKeyPair::from_private_key(&bytes).unwrap()
    }

    #[test]
    fn single_sig_witness_verifies() {
        let pair = key_pair(0x11);
        let message = b"witness test message";
        let witness = Witness::create(message, &pair).unwrap();

        let invocation = witness.invocation.script();
        assert_eq!(invocation[0], 0x0c);
        assert_eq!(invocation[1], 64);
        assert!(pair
            .public_key()
            .verify_signature(message, &invocation[2..])
            .unwrap());
        assert!(witness.verification.is_single_sig());
    }

    #[test]
    fn multi_sig_witness_orders_signatures_by_key() {
        let pairs = [key_pair(0x11), key_pair(0x22), key_pair(0x33)];
        let keys: Vec<ECPublicKey> = pairs.iter().map(|p| p.public_key().clone()).collect();
        let verification = VerificationScript::from_public_keys(&keys, 2).unwrap();
        let message = b"multi-sig message";

        // Offer signatures in an arbitrary order.
        let signatures: Vec<(ECPublicKey, Vec<u8>)> = pairs
            .iter()
            .rev()
            .map(|p| {
                (
                    p.public_key().clone(),
                    p.sign_message(message).unwrap().to_vec(),
                )
            })
            .collect();

        let witness =
            Witness::create_multi_sig_witness(verification.clone(), &signatures).unwrap();
        let invocation = witness.invocation.script();
        assert_eq!(invocation.len(), 2 * 66);

        // The first signature in the invocation belongs to the first key
        // of the (sorted) verification script.
        let script_keys = verification.public_keys().unwrap();
        let first_sig = &invocation[2..66];
        assert!(script_keys[0]
            .verify_signature(message, first_sig)
            .unwrap());
    }

    #[test]
    fn multi_sig_witness_below_threshold_fails() {
        let pairs = [key_pair(0x11), key_pair(0x22), key_pair(0x33)];
        let keys: Vec<ECPublicKey> = pairs.iter().map(|p| p.public_key().clone()).collect();
        let verification = VerificationScript::from_public_keys(&keys, 3).unwrap();

        let signatures = vec![(
            pairs[0].public_key().clone(),
            pairs[0].sign_message(b"m").unwrap().to_vec(),
        )];
        assert!(matches!(
            Witness::create_multi_sig_witness(verification, &signatures),
            Err(TransactionError::InsufficientSignatures {
                required: 3,
                provided: 1
            })
        ));
    }

    #[test]
    fn contract_witness_has_empty_verification() {
        let witness = Witness::contract_witness(&[
            ContractParameter::string("iamgroot"),
            ContractParameter::integer(2),
        ])
        .unwrap();
        assert!(witness.verification.is_empty());
        let mut expected = ScriptBuilder::new();
        expected.push_string("iamgroot");
        expected.push_int(2);
        assert_eq!(witness.invocation.script(), expected.into_bytes());
    }

    #[test]
    fn round_trip() {
        let pair = key_pair(0x44);
        let witness = Witness::create(b"round trip", &pair).unwrap();
        let bytes = witness.to_array();
        assert_eq!(bytes.len(), witness.size());
        assert_eq!(Witness::from_bytes(&bytes).unwrap(), witness);
    }
}
