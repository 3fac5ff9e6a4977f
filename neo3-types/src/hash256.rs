//! 256-bit transaction and block hash type.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{TypeError, TypeResult};
use crate::hash::hash256;

/// Byte length of a [`Hash256`].
pub const HASH256_SIZE: usize = 32;

/// A 256-bit hash identifying a transaction or block.
///
/// Stored little-endian like the wire format; displayed as big-endian hex
/// with a `0x` prefix.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Hash256([u8; HASH256_SIZE]);

impl Hash256 {
    /// The zero hash.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Creates a hash from a little-endian byte array.
    pub fn from_array(bytes: [u8; HASH256_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates a hash from little-endian bytes.
    pub fn from_bytes(bytes: &[u8]) -> TypeResult<Self> {
        let arr: [u8; HASH256_SIZE] = bytes
            .try_into()
            .map_err(|_| TypeError::invalid_length("Hash256", HASH256_SIZE, bytes.len()))?;
        Ok(Self(arr))
    }

    /// Computes the double SHA-256 hash of the given data.
    pub fn from_data(data: &[u8]) -> Self {
        Self(hash256(data))
    }

    /// The little-endian bytes, as serialized on the wire.
    pub fn as_bytes(&self) -> &[u8; HASH256_SIZE] {
        &self.0
    }

    /// The little-endian bytes as an owned array.
    pub fn to_array(&self) -> [u8; HASH256_SIZE] {
        self.0
    }

    /// The big-endian bytes, as used in the textual representation.
    pub fn to_be_array(&self) -> [u8; HASH256_SIZE] {
        let mut out = self.0;
        out.reverse();
        out
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_be_array()))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({self})")
    }
}

impl FromStr for Hash256 {
    type Err = TypeError;

    /// Parses a big-endian hex string, with or without the `0x` prefix.
    fn from_str(s: &str) -> TypeResult<Self> {
        let hex_str = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = hex::decode(hex_str)
            .map_err(|e| TypeError::invalid_hex("Hash256", e.to_string()))?;
        bytes.reverse();
        Self::from_bytes(&bytes)
    }
}

impl Ord for Hash256 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_be_array().cmp(&other.to_be_array())
    }
}

impl PartialOrd for Hash256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let text = "0xb6b4cd27d72aa271653008bd3a0b5ccbfbbd46d99a0a7b4a51f175ae7cb45fb3";
        let hash: Hash256 = text.parse().unwrap();
        assert_eq!(hash.to_string(), text);
    }

    #[test]
    fn double_sha256() {
        let hash = Hash256::from_data(b"hello");
        assert_eq!(
            hex::encode(hash.as_bytes()),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Hash256::from_bytes(&[0u8; 31]).is_err());
    }
}
