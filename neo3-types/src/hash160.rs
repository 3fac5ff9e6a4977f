//! 160-bit script hash type.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{TypeError, TypeResult};
use crate::hash::{base58_check_decode, base58_check_encode, sha256_ripemd160};
use crate::ADDRESS_VERSION;

/// Byte length of a [`Hash160`].
pub const HASH160_SIZE: usize = 20;

/// A 160-bit hash identifying a script or account on the Neo blockchain.
///
/// The bytes are stored in little-endian order, matching the wire format.
/// The textual representation is big-endian hex with a `0x` prefix.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Hash160([u8; HASH160_SIZE]);

impl Hash160 {
    /// The zero hash.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns true if all bytes are zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Creates a hash from little-endian bytes.
    pub fn from_bytes(bytes: &[u8]) -> TypeResult<Self> {
        let arr: [u8; HASH160_SIZE] = bytes
            .try_into()
            .map_err(|_| TypeError::invalid_length("Hash160", HASH160_SIZE, bytes.len()))?;
        Ok(Self(arr))
    }

    /// Derives the hash of a script: `RIPEMD160(SHA256(script))`.
    pub fn from_script(script: &[u8]) -> Self {
        Self(sha256_ripemd160(script))
    }

    /// Parses an N3 address into the script hash it encodes.
    pub fn from_address(address: &str) -> TypeResult<Self> {
        let payload = base58_check_decode(address)?;
        if payload.len() != HASH160_SIZE + 1 {
            return Err(TypeError::invalid_length(
                "address payload",
                HASH160_SIZE + 1,
                payload.len(),
            ));
        }
        if payload[0] != ADDRESS_VERSION {
            return Err(TypeError::InvalidAddressVersion {
                expected: ADDRESS_VERSION,
                actual: payload[0],
            });
        }
        Self::from_bytes(&payload[1..])
    }

    /// Encodes this script hash as an N3 address.
    pub fn to_address(&self) -> String {
        let mut payload = Vec::with_capacity(HASH160_SIZE + 1);
        payload.push(ADDRESS_VERSION);
        payload.extend_from_slice(&self.0);
        base58_check_encode(&payload)
    }

    /// The little-endian bytes, as serialized on the wire.
    pub fn as_bytes(&self) -> &[u8; HASH160_SIZE] {
        &self.0
    }

    /// The little-endian bytes as an owned array.
    pub fn to_array(&self) -> [u8; HASH160_SIZE] {
        self.0
    }

    /// The big-endian bytes, as used in the textual representation.
    pub fn to_be_array(&self) -> [u8; HASH160_SIZE] {
        let mut out = self.0;
        out.reverse();
        out
    }
}

impl fmt::Display for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_be_array()))
    }
}

impl fmt::Debug for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash160({self})")
    }
}

impl FromStr for Hash160 {
    type Err = TypeError;

    /// Parses a big-endian hex string, with or without the `0x` prefix.
    fn from_str(s: &str) -> TypeResult<Self> {
        let hex_str = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = hex::decode(hex_str)
            .map_err(|e| TypeError::invalid_hex("Hash160", e.to_string()))?;
        bytes.reverse();
        Self::from_bytes(&bytes)
    }
}

impl Ord for Hash160 {
    fn cmp(&self, other: &Self) -> Ordering {
        // Compare in the big-endian (numeric) order.
        self.to_be_array().cmp(&other.to_be_array())
    }
}

impl PartialOrd for Hash160 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Hash160 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash160 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_reverses_byte_order() {
        let hash: Hash160 = "0x23ba2703c53263e8d6e522dc32203339dcd8eee9"
            .parse()
            .unwrap();
        assert_eq!(
            hex::encode(hash.as_bytes()),
            "e9eed8dc39332032dc22e5d6e86332c50327ba23"
        );
        assert_eq!(hash.to_string(), "0x23ba2703c53263e8d6e522dc32203339dcd8eee9");
    }

    #[test]
    fn script_hash_of_known_verification_script() {
        let script = hex::decode(
            "0c21027a593180860c4037c83c12749845c8ee1424dd297fadcb895e358255d2c7d2b24156e7b327",
        )
        .unwrap();
        let hash = Hash160::from_script(&script);
        assert_eq!(
            hex::encode(hash.as_bytes()),
            "8e8397e6752f1d9b533757b12f934409aa0efa8b"
        );
    }

    #[test]
    fn address_round_trip() {
        let script = hex::decode(
            "0c21027a593180860c4037c83c12749845c8ee1424dd297fadcb895e358255d2c7d2b24156e7b327",
        )
        .unwrap();
        let hash = Hash160::from_script(&script);
        let address = hash.to_address();
        assert_eq!(address, "NYuWnGCRUWaMLDCf5rYngLtVivEeRQ1j7u");
        assert_eq!(Hash160::from_address(&address).unwrap(), hash);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Hash160::from_bytes(&[0u8; 19]).is_err());
        assert!(Hash160::from_bytes(&[0u8; 21]).is_err());
    }

    #[test]
    fn rejects_wrong_address_version() {
        // A valid Base58Check string with version 0x17 instead of 0x35.
        let mut payload = vec![0x17];
        payload.extend_from_slice(&[0u8; 20]);
        let address = crate::hash::base58_check_encode(&payload);
        assert!(matches!(
            Hash160::from_address(&address),
            Err(TypeError::InvalidAddressVersion { .. })
        ));
    }
}
