//! Hash primitives and Base58Check codecs used across the toolkit.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::{TypeError, TypeResult};

/// Computes the SHA-256 digest of the given data.
pub fn sha256<T: AsRef<[u8]>>(data: T) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hasher.finalize().into()
}

/// Computes the double SHA-256 digest of the given data.
pub fn hash256<T: AsRef<[u8]>>(data: T) -> [u8; 32] {
    sha256(sha256(data))
}

/// Computes the RIPEMD-160 digest of the given data.
pub fn ripemd160<T: AsRef<[u8]>>(data: T) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data.as_ref());
    hasher.finalize().into()
}

/// Computes RIPEMD-160 over the SHA-256 of the data. This is the script
/// hash function of the Neo protocol.
pub fn sha256_ripemd160<T: AsRef<[u8]>>(data: T) -> [u8; 20] {
    ripemd160(sha256(data))
}

/// Encodes the payload with a 4-byte double-SHA-256 checksum appended.
pub fn base58_check_encode(payload: &[u8]) -> String {
    let checksum = &hash256(payload)[..4];
    let mut data = Vec::with_capacity(payload.len() + 4);
    data.extend_from_slice(payload);
    data.extend_from_slice(checksum);
    bs58::encode(data).into_string()
}

/// Decodes a Base58Check string, verifying and stripping the checksum.
pub fn base58_check_decode(encoded: &str) -> TypeResult<Vec<u8>> {
    let decoded = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| TypeError::invalid_base58(e.to_string()))?;
    if decoded.len() < 4 {
        return Err(TypeError::invalid_base58("data shorter than checksum"));
    }
    let (payload, checksum) = decoded.split_at(decoded.len() - 4);
    if &hash256(payload)[..4] != checksum {
        return Err(TypeError::invalid_base58("checksum mismatch"));
    }
    Ok(payload.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn base58_check_round_trip() {
        let payload = vec![0x35, 0x01, 0x02, 0x03];
        let encoded = base58_check_encode(&payload);
        assert_eq!(base58_check_decode(&encoded).unwrap(), payload);
    }

    #[test]
    fn base58_check_rejects_corruption() {
        let payload = vec![0x35, 0x01, 0x02, 0x03];
        let mut encoded = base58_check_encode(&payload);
        // Swap the last character for a different Base58 digit.
        let last = encoded.pop().unwrap();
        encoded.push(if last == '1' { '2' } else { '1' });
        assert!(base58_check_decode(&encoded).is_err());
    }
}
