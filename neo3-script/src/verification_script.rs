//! Verification scripts: the account-identity half of a witness.

use neo3_io::{var_size_bytes, BinaryWriter, IoResult, MemoryReader, Serializable};
use neo3_types::{ECPublicKey, Hash160, PUBLIC_KEY_SIZE};

use crate::error::{ScriptError, ScriptResult};
use crate::interop::InteropService;
use crate::op_code::OpCode;
use crate::script_builder::ScriptBuilder;
use crate::MAX_MULTISIG_KEYS;

/// Maximum byte length accepted when deserializing a verification script.
const MAX_VERIFICATION_SCRIPT_LEN: usize = 1024 * 64;

/// A verification script. Its hash is the account identity.
///
/// Two canonical shapes exist: the single-signature form
/// `PUSHDATA1 33 <key> SYSCALL CheckSig` and the multi-signature form
/// `PUSHINT(m) (PUSHDATA1 33 <key>)* PUSHINT(n) SYSCALL CheckMultisig`
/// with the keys sorted ascending by their compressed encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationScript {
    script: Vec<u8>,
}

impl VerificationScript {
    /// An empty verification script (used by contract witnesses).
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps raw script bytes.
    pub fn from_bytes_raw(script: Vec<u8>) -> Self {
        Self { script }
    }

    /// Builds the canonical single-signature script for a public key.
    pub fn from_public_key(key: &ECPublicKey) -> Self {
        let mut builder = ScriptBuilder::new();
        builder
            .push_data(key.as_bytes())
            .sys_call(InteropService::SystemCryptoCheckSig);
        Self {
            script: builder.into_bytes(),
        }
    }

    /// Builds the canonical `m`-of-`n` multi-signature script.
    ///
    /// The keys are sorted by their compressed encoding before emission;
    /// callers do not need to pre-sort.
    pub fn from_public_keys(keys: &[ECPublicKey], threshold: usize) -> ScriptResult<Self> {
        let n = keys.len();
        if threshold < 1 || threshold > n {
            return Err(ScriptError::invalid_multi_sig(format!(
                "signing threshold {threshold} out of range for {n} keys"
            )));
        }
        if n > MAX_MULTISIG_KEYS {
            return Err(ScriptError::invalid_multi_sig(format!(
                "{n} keys exceed the maximum of {MAX_MULTISIG_KEYS}"
            )));
        }
        let mut sorted: Vec<&ECPublicKey> = keys.iter().collect();
        sorted.sort();

        let mut builder = ScriptBuilder::new();
        builder
            .push_integer(&threshold.into())
            .map_err(|_| ScriptError::invalid_multi_sig("threshold too large"))?;
        for key in sorted {
            builder.push_data(key.as_bytes());
        }
        builder
            .push_integer(&n.into())
            .map_err(|_| ScriptError::invalid_multi_sig("key count too large"))?;
        builder.sys_call(InteropService::SystemCryptoCheckMultisig);
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

    /// The script hash, i.e. the account identity.
    pub fn script_hash(&self) -> Hash160 {
        Hash160::from_script(&self.script)
    }

    /// Whether this is a canonical single-signature script.
    pub fn is_single_sig(&self) -> bool {
        self.script.len() == 40
            && self.script[0] == OpCode::PUSHDATA1.byte()
            && self.script[1] == PUBLIC_KEY_SIZE as u8
            && self.script[35] == OpCode::SYSCALL.byte()
            && self.script[36..] == InteropService::SystemCryptoCheckSig.hash()
    }

    /// Whether this is a canonical multi-signature script.
    pub fn is_multi_sig(&self) -> bool {
        self.parse_multi_sig().is_ok()
    }

    /// Recovers the signing threshold `m`.
    ///
    /// Returns 1 for a single-signature script. For a multi-signature
    /// script the leading push is decoded: `PUSH1..PUSH16` encode the
    /// value directly, `PUSHINT8/16/32` carry a little-endian operand.
    pub fn signing_threshold(&self) -> ScriptResult<usize> {
        if self.is_single_sig() {
            return Ok(1);
        }
        let (threshold, _) = self.parse_multi_sig()?;
        Ok(threshold)
    }

    /// The number of accounts that can contribute signatures: 1 for
    /// single-sig, `n` for multi-sig.
    pub fn nr_of_accounts(&self) -> ScriptResult<usize> {
        Ok(self.public_keys()?.len())
    }

    /// Extracts the public keys encoded in the script, in script order.
    pub fn public_keys(&self) -> ScriptResult<Vec<ECPublicKey>> {
        if self.is_single_sig() {
            let key = ECPublicKey::from_bytes(&self.script[2..35]).map_err(|e| {
                ScriptError::invalid_script_format("single-sig", e.to_string())
            })?;
            return Ok(vec![key]);
        }
        let (_, keys) = self.parse_multi_sig()?;
        Ok(keys)
    }

    // Parses the multi-sig shape, returning the threshold and the keys.
    fn parse_multi_sig(&self) -> ScriptResult<(usize, Vec<ECPublicKey>)> {
        let mut pos = 0;
        let threshold = self.read_int_push(&mut pos)?;

        let mut keys = Vec::new();
        while pos + 1 < self.script.len()
            && self.script[pos] == OpCode::PUSHDATA1.byte()
            && self.script[pos + 1] == PUBLIC_KEY_SIZE as u8
        {
            if pos + 2 + PUBLIC_KEY_SIZE > self.script.len() {
                return Err(ScriptError::invalid_script_format(
                    "multi-sig",
                    "truncated public key push",
                ));
            }
            let key = ECPublicKey::from_bytes(&self.script[pos + 2..pos + 2 + PUBLIC_KEY_SIZE])
                .map_err(|e| ScriptError::invalid_script_format("multi-sig", e.to_string()))?;
            keys.push(key);
            pos += 2 + PUBLIC_KEY_SIZE;
        }

        let n = self.read_int_push(&mut pos)?;
        if n != keys.len() {
            return Err(ScriptError::invalid_script_format(
                "multi-sig",
                format!("key count push {n} does not match {} keys", keys.len()),
            ));
        }
        if threshold < 1 || threshold > n {
            return Err(ScriptError::invalid_script_format(
                "multi-sig",
                format!("threshold {threshold} out of range for {n} keys"),
            ));
        }
        if self.script.len() != pos + 5
            || self.script[pos] != OpCode::SYSCALL.byte()
            || self.script[pos + 1..] != InteropService::SystemCryptoCheckMultisig.hash()
        {
            return Err(ScriptError::invalid_script_format(
                "multi-sig",
                "missing CheckMultisig syscall",
            ));
        }
        Ok((threshold, keys))
    }

    // Reads a PUSH1..16 or PUSHINT8/16/32 integer at `pos`, advancing it.
    fn read_int_push(&self, pos: &mut usize) -> ScriptResult<usize> {
        let opcode = *self.script.get(*pos).ok_or_else(|| {
            ScriptError::invalid_script_format("multi-sig", "script too short")
        })?;
        *pos += 1;
        if (OpCode::PUSH1.byte()..=OpCode::PUSH16.byte()).contains(&opcode) {
            return Ok((opcode - OpCode::PUSH0.byte()) as usize);
        }
        let width = match opcode {
            b if b == OpCode::PUSHINT8.byte() => 1,
            b if b == OpCode::PUSHINT16.byte() => 2,
            b if b == OpCode::PUSHINT32.byte() => 4,
            other => {
                return Err(ScriptError::invalid_script_format(
                    "multi-sig",
                    format!("unexpected opcode {other:#04x} in integer position"),
                ))
            }
        };
        if *pos + width > self.script.len() {
            return Err(ScriptError::invalid_script_format(
                "multi-sig",
                "truncated integer operand",
            ));
        }
        let mut value: u64 = 0;
        for (i, byte) in self.script[*pos..*pos + width].iter().enumerate() {
            value |= (*byte as u64) << (8 * i);
        }
        *pos += width;
        Ok(value as usize)
    }
}

impl Serializable for VerificationScript {
    fn size(&self) -> usize {
        var_size_bytes(&self.script)
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_var_bytes(&self.script);
    }

    fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self> {
        let script = reader.read_var_bytes("verification script", MAX_VERIFICATION_SCRIPT_LEN)?;
        Ok(Self { script })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const KEY_HEX: &str = "027a593180860c4037c83c12749845c8ee1424dd297fadcb895e358255d2c7d2b2";

    fn key(hex_str: &str) -> ECPublicKey {
        ECPublicKey::from_str(hex_str).unwrap()
    }

    #[test]
    fn single_sig_script_shape() {
        let script = VerificationScript::from_public_key(&key(KEY_HEX));
        let expected = format!("0c21{KEY_HEX}4156e7b327");
        assert_eq!(hex::encode(script.script()), expected);
        assert!(script.is_single_sig());
        assert!(!script.is_multi_sig());
        assert_eq!(script.signing_threshold().unwrap(), 1);
        assert_eq!(script.script_hash().to_address(), "NYuWnGCRUWaMLDCf5rYngLtVivEeRQ1j7u");
    }

    #[test]
    fn multi_sig_script_sorts_keys() {
        let a = key("02028a99826edc0c97d18e22b6932373d908d323aa7f92656a77ec26e8861699ef");
        let b = key("031d8e1630ce640966967bc6d95223d21f44304133003140c3b52004dc981349c9");
        let c = key("02232ce8d2e2063dce0451131851d47421bfc4fc1da4db116fca5302c0756462fa");

        let script = VerificationScript::from_public_keys(&[b.clone(), c.clone(), a.clone()], 2)
            .unwrap();
        // a < c < b by compressed-encoding order.
        assert_eq!(script.public_keys().unwrap(), vec![a, c, b]);
        assert_eq!(script.signing_threshold().unwrap(), 2);
        assert_eq!(script.nr_of_accounts().unwrap(), 3);
        assert!(script.is_multi_sig());
        assert!(!script.is_single_sig());

        let bytes = script.script();
        assert_eq!(bytes[0], OpCode::PUSH2.byte());
        assert_eq!(bytes[bytes.len() - 6], OpCode::PUSH3.byte());
        assert_eq!(bytes[bytes.len() - 5], OpCode::SYSCALL.byte());
        assert_eq!(&bytes[bytes.len() - 4..], &[0x9e, 0xd0, 0xdc, 0x3a]);
    }

    #[test]
    fn threshold_from_pushint_forms() {
        // Thresholds beyond PUSH16 use PUSHINT8/16 little-endian pushes.
        // The same key may back several slots, so large n needs no key
        // generation.
        let one_key = key(KEY_HEX);
        for m in [17usize, 255, 256, 1024] {
            let keys = vec![one_key.clone(); m];
            let script = VerificationScript::from_public_keys(&keys, m).unwrap();
            assert_eq!(script.signing_threshold().unwrap(), m, "m = {m}");
            assert_eq!(script.nr_of_accounts().unwrap(), m, "m = {m}");
        }

        // The leading push of a 255-of-255 script is PUSHINT16 ff00.
        let keys = vec![one_key; 255];
        let script = VerificationScript::from_public_keys(&keys, 255).unwrap();
        assert_eq!(&script.script()[..3], &[0x01, 0xff, 0x00]);
    }

    #[test]
    fn threshold_vectors() {
        // m is recovered from the leading push across encodings.
        let a = key("02028a99826edc0c97d18e22b6932373d908d323aa7f92656a77ec26e8861699ef");
        let b = key("031d8e1630ce640966967bc6d95223d21f44304133003140c3b52004dc981349c9");
        let c = key("02232ce8d2e2063dce0451131851d47421bfc4fc1da4db116fca5302c0756462fa");
        for m in [1, 2, 3] {
            let script = VerificationScript::from_public_keys(
                &[a.clone(), b.clone(), c.clone()],
                m,
            )
            .unwrap();
            assert_eq!(script.signing_threshold().unwrap(), m);
        }
        assert!(VerificationScript::from_public_keys(&[a.clone()], 0).is_err());
        assert!(VerificationScript::from_public_keys(&[a], 2).is_err());
    }

    #[test]
    fn deserialize_with_two_byte_length_prefix() {
        // 256 bytes of 0x01 behind an FD 00 01 varint prefix.
        let mut bytes = vec![0xfd, 0x00, 0x01];
        bytes.extend_from_slice(&[0x01; 256]);
        let script = VerificationScript::from_bytes(&bytes).unwrap();
        assert_eq!(script.script(), &[0x01; 256][..]);
    }

    #[test]
    fn serialize_single_sig_has_length_prefix() {
        let script = VerificationScript::from_public_key(&key(KEY_HEX));
        let bytes = script.to_array();
        assert_eq!(bytes[0], 40);
        assert_eq!(bytes.len(), 41);
        assert_eq!(VerificationScript::from_bytes(&bytes).unwrap(), script);
    }
}
