//! Core value types for the Neo N3 blockchain.
//!
//! This crate provides the primitive types shared by all higher layers:
//! fixed-size script and transaction hashes, EC key pairs on secp256r1,
//! Base58Check address and WIF codecs, and typed contract parameters.

pub mod contract_parameter;
pub mod error;
pub mod hash;
pub mod hash160;
pub mod hash256;
pub mod key_pair;

pub use contract_parameter::{ContractParameter, ContractParameterType};
pub use error::{TypeError, TypeResult};
pub use hash160::Hash160;
pub use hash256::Hash256;
pub use key_pair::{ensure_crypto_provider, ECKeyPair, ECPublicKey};

/// The version byte prepended to a script hash when deriving an N3 address.
pub const ADDRESS_VERSION: u8 = 0x35;

/// The version byte of a WIF-encoded private key.
pub const WIF_VERSION: u8 = 0x80;

/// Byte length of a compressed SEC1 public key.
pub const PUBLIC_KEY_SIZE: usize = 33;

/// Byte length of a private key.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Byte length of a raw ECDSA signature (r || s).
pub const SIGNATURE_SIZE: usize = 64;
