//! EC key pairs on the secp256r1 curve.
//!
//! Private keys are 32-byte big-endian scalars; public keys are SEC1
//! compressed points (33 bytes). Signing is deterministic ECDSA
//! (RFC 6979) over a SHA-256 digest, producing a 64-byte `r || s`
//! signature with a normalized low `s`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::OnceCell;
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{TypeError, TypeResult};
use crate::hash::{base58_check_decode, base58_check_encode, sha256};
use crate::hash160::Hash160;
use crate::{PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, SIGNATURE_SIZE, WIF_VERSION};

static CRYPTO_PROVIDER: OnceCell<()> = OnceCell::new();

/// Ensures the process-wide EC provider is initialized.
///
/// Idempotent and safe to call repeatedly. All key operations in this
/// module call it on entry, so callers only need it when they want to
/// front-load initialization cost.
pub fn ensure_crypto_provider() {
    CRYPTO_PROVIDER.get_or_init(|| ());
}

/// A secp256r1 public key in SEC1 compressed form.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ECPublicKey([u8; PUBLIC_KEY_SIZE]);

impl ECPublicKey {
    /// Creates a public key from SEC1 bytes. Accepts the compressed
    /// (33-byte) and uncompressed (65-byte) encodings; the key is stored
    /// compressed either way.
    pub fn from_bytes(bytes: &[u8]) -> TypeResult<Self> {
        ensure_crypto_provider();
        let key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| TypeError::invalid_public_key(e.to_string()))?;
        let point = key.to_encoded_point(true);
        let arr: [u8; PUBLIC_KEY_SIZE] = point
            .as_bytes()
            .try_into()
            .map_err(|_| TypeError::invalid_public_key("unexpected encoding length"))?;
        Ok(Self(arr))
    }

    /// The SEC1 compressed encoding.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0
    }

    /// The SEC1 compressed encoding as a slice.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Reconstructs the curve point for verification.
    pub fn verifying_key(&self) -> TypeResult<VerifyingKey> {
        VerifyingKey::from_sec1_bytes(&self.0)
            .map_err(|e| TypeError::invalid_public_key(e.to_string()))
    }

    /// Verifies a 64-byte `r || s` signature over the SHA-256 digest of
    /// `message`.
    pub fn verify_signature(&self, message: &[u8], signature: &[u8]) -> TypeResult<bool> {
        ensure_crypto_provider();
        if signature.len() != SIGNATURE_SIZE {
            return Err(TypeError::invalid_signature(format!(
                "expected {SIGNATURE_SIZE} bytes, got {}",
                signature.len()
            )));
        }
        let sig = Signature::from_slice(signature)
            .map_err(|e| TypeError::invalid_signature(e.to_string()))?;
        let digest = sha256(message);
        Ok(self.verifying_key()?.verify_prehash(&digest, &sig).is_ok())
    }
}

impl fmt::Display for ECPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ECPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ECPublicKey({self})")
    }
}

impl FromStr for ECPublicKey {
    type Err = TypeError;

    fn from_str(s: &str) -> TypeResult<Self> {
        let hex_str = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(hex_str)
            .map_err(|e| TypeError::invalid_hex("ECPublicKey", e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl Ord for ECPublicKey {
    /// Keys order by their compressed encoding, ascending. Multi-sig
    /// verification scripts rely on this ordering.
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for ECPublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A secp256r1 key pair.
///
/// The private key material is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ECKeyPair {
    private_key: [u8; PRIVATE_KEY_SIZE],
    #[zeroize(skip)]
    public_key: ECPublicKey,
}

impl ECKeyPair {
    /// Generates a new random key pair.
    pub fn generate() -> TypeResult<Self> {
        ensure_crypto_provider();
        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        loop {
            rand::rngs::OsRng.fill_bytes(&mut bytes);
            // The scalar may fall outside the curve order; retry until valid.
            if SigningKey::from_slice(&bytes).is_ok() {
                break;
            }
        }
        let pair = Self::from_private_key(&bytes)?;
        bytes.zeroize();
        Ok(pair)
    }

    /// Creates a key pair from a 32-byte big-endian private key.
    pub fn from_private_key(private_key: &[u8]) -> TypeResult<Self> {
        ensure_crypto_provider();
        let arr: [u8; PRIVATE_KEY_SIZE] = private_key.try_into().map_err(|_| {
            TypeError::invalid_length("private key", PRIVATE_KEY_SIZE, private_key.len())
        })?;
        let signing_key = SigningKey::from_slice(&arr)
            .map_err(|e| TypeError::invalid_private_key(e.to_string()))?;
        let point = signing_key.verifying_key().to_encoded_point(true);
        let public_key = ECPublicKey::from_bytes(point.as_bytes())?;
        Ok(Self {
            private_key: arr,
            public_key,
        })
    }

    /// Imports a key pair from a WIF string.
    pub fn from_wif(wif: &str) -> TypeResult<Self> {
        let payload = base58_check_decode(wif)
            .map_err(|_| TypeError::InvalidWif { reason: "Base58Check decoding failed" })?;
        if payload.len() != 34 {
            return Err(TypeError::InvalidWif { reason: "wrong payload length" });
        }
        if payload[0] != WIF_VERSION {
            return Err(TypeError::InvalidWif { reason: "wrong version byte" });
        }
        if payload[33] != 0x01 {
            return Err(TypeError::InvalidWif { reason: "missing compression flag" });
        }
        Self::from_private_key(&payload[1..33])
    }

    /// Exports the private key in WIF.
    pub fn export_as_wif(&self) -> String {
        let mut payload = Vec::with_capacity(34);
        payload.push(WIF_VERSION);
        payload.extend_from_slice(&self.private_key);
        payload.push(0x01);
        let encoded = base58_check_encode(&payload);
        payload.zeroize();
        encoded
    }

    /// The 32-byte big-endian private key.
    pub fn private_key(&self) -> &[u8; PRIVATE_KEY_SIZE] {
        &self.private_key
    }

    /// The public key.
    pub fn public_key(&self) -> &ECPublicKey {
        &self.public_key
    }

    /// The script hash of this key's single-signature verification
    /// script, i.e. the account identity.
    pub fn script_hash(&self) -> Hash160 {
        Hash160::from_script(&single_sig_verification_script(&self.public_key))
    }

    /// The N3 address of this key pair's account.
    pub fn address(&self) -> String {
        self.script_hash().to_address()
    }

    /// Signs the SHA-256 digest of `message` with deterministic ECDSA,
    /// returning the 64-byte `r || s` signature.
    pub fn sign_message(&self, message: &[u8]) -> TypeResult<[u8; SIGNATURE_SIZE]> {
        ensure_crypto_provider();
        let signing_key = SigningKey::from_slice(&self.private_key)
            .map_err(|e| TypeError::invalid_private_key(e.to_string()))?;
        let digest = sha256(message);
        let signature: Signature = signing_key
            .sign_prehash(&digest)
            .map_err(|e| TypeError::invalid_signature(e.to_string()))?;
        let signature = signature.normalize_s().unwrap_or(signature);
        let mut out = [0u8; SIGNATURE_SIZE];
        out.copy_from_slice(&signature.to_bytes());
        Ok(out)
    }
}

impl fmt::Debug for ECKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print private key material.
        write!(f, "ECKeyPair({})", self.public_key)
    }
}

impl PartialEq for ECKeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.private_key == other.private_key
    }
}

impl Eq for ECKeyPair {}

// The canonical single-sig verification script, duplicated here from the
// script layer to keep this crate a dependency leaf:
// PUSHDATA1 33 <key> SYSCALL <System.Crypto.CheckSig>.
fn single_sig_verification_script(key: &ECPublicKey) -> Vec<u8> {
    let mut script = Vec::with_capacity(40);
    script.push(0x0c);
    script.push(PUBLIC_KEY_SIZE as u8);
    script.extend_from_slice(key.as_bytes());
    script.push(0x41);
    script.extend_from_slice(&sha256(b"System.Crypto.CheckSig")[..4]);
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_KEY_HEX: &str =
        "e6e919577dd7b8e97805151c05ae07ff4f752654d6d8797597aca989c02c4cb3";

    #[test]
    fn public_key_from_private_key_is_compressed() {
        let pair =
            ECKeyPair::from_private_key(&hex::decode(PRIVATE_KEY_HEX).unwrap()).unwrap();
        let encoded = pair.public_key().to_bytes();
        assert_eq!(encoded.len(), 33);
        assert!(encoded[0] == 0x02 || encoded[0] == 0x03);
    }

    #[test]
    fn uncompressed_input_is_recompressed() {
        let pair = ECKeyPair::generate().unwrap();
        let verifying = pair.public_key().verifying_key().unwrap();
        let uncompressed = verifying.to_encoded_point(false);
        let key = ECPublicKey::from_bytes(uncompressed.as_bytes()).unwrap();
        assert_eq!(&key, pair.public_key());
    }

    #[test]
    fn wif_round_trip() {
        let pair =
            ECKeyPair::from_private_key(&hex::decode(PRIVATE_KEY_HEX).unwrap()).unwrap();
        let wif = pair.export_as_wif();
        let restored = ECKeyPair::from_wif(&wif).unwrap();
        assert_eq!(restored.private_key(), pair.private_key());
    }

    #[test]
    fn wif_rejects_bad_version() {
        let mut payload = vec![0x81];
        payload.extend_from_slice(&hex::decode(PRIVATE_KEY_HEX).unwrap());
        payload.push(0x01);
        let wif = crate::hash::base58_check_encode(&payload);
        assert!(matches!(
            ECKeyPair::from_wif(&wif),
            Err(TypeError::InvalidWif { .. })
        ));
    }

    #[test]
    fn sign_and_verify() {
        let pair = ECKeyPair::generate().unwrap();
        let message = b"neo3 signing test";
        let signature = pair.sign_message(message).unwrap();
        assert!(pair
            .public_key()
            .verify_signature(message, &signature)
            .unwrap());
        assert!(!pair
            .public_key()
            .verify_signature(b"different message", &signature)
            .unwrap());
    }

    #[test]
    fn signing_is_deterministic() {
        let pair =
            ECKeyPair::from_private_key(&hex::decode(PRIVATE_KEY_HEX).unwrap()).unwrap();
        let a = pair.sign_message(b"payload").unwrap();
        let b = pair.sign_message(b"payload").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn public_key_ordering_is_bytewise() {
        let a: ECPublicKey =
            "02028a99826edc0c97d18e22b6932373d908d323aa7f92656a77ec26e8861699ef"
                .parse()
                .unwrap();
        let b: ECPublicKey =
            "031d8e1630ce640966967bc6d95223d21f44304133003140c3b52004dc981349c9"
                .parse()
                .unwrap();
        assert!(a < b);
    }
}
