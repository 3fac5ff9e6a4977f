//! Error types for value-type parsing and cryptographic operations.

use thiserror::Error;

/// Errors raised by hash, address, and key operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// A byte slice had the wrong length for the target type.
    #[error("invalid length for {target}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        target: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A hex string could not be decoded.
    #[error("invalid hex in {context}: {reason}")]
    InvalidHex { context: &'static str, reason: String },

    /// A Base58Check payload failed to decode or verify.
    #[error("invalid Base58Check data: {reason}")]
    InvalidBase58 { reason: String },

    /// An address did not carry the expected version byte.
    #[error("invalid address version: expected {expected:#04x}, got {actual:#04x}")]
    InvalidAddressVersion { expected: u8, actual: u8 },

    /// A WIF string was malformed.
    #[error("invalid WIF: {reason}")]
    InvalidWif { reason: &'static str },

    /// A public key was not a valid point on secp256r1.
    #[error("invalid public key: {reason}")]
    InvalidPublicKey { reason: String },

    /// A private key scalar was out of range for secp256r1.
    #[error("invalid private key: {reason}")]
    InvalidPrivateKey { reason: String },

    /// A signature had the wrong size or failed to parse.
    #[error("invalid signature: {reason}")]
    InvalidSignature { reason: String },
}

impl TypeError {
    pub fn invalid_length(target: &'static str, expected: usize, actual: usize) -> Self {
        Self::InvalidLength {
            target,
            expected,
            actual,
        }
    }

    pub fn invalid_hex(context: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidHex {
            context,
            reason: reason.into(),
        }
    }

    pub fn invalid_base58(reason: impl Into<String>) -> Self {
        Self::InvalidBase58 {
            reason: reason.into(),
        }
    }

    pub fn invalid_public_key(reason: impl Into<String>) -> Self {
        Self::InvalidPublicKey {
            reason: reason.into(),
        }
    }

    pub fn invalid_private_key(reason: impl Into<String>) -> Self {
        Self::InvalidPrivateKey {
            reason: reason.into(),
        }
    }

    pub fn invalid_signature(reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            reason: reason.into(),
        }
    }
}

/// Result type for value-type operations.
pub type TypeResult<T> = std::result::Result<T, TypeError>;
