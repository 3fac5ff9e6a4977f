//! Interop service identifiers.
//!
//! A syscall operand is the first four bytes of the SHA-256 digest of the
//! service's ASCII name.

use sha2::{Digest, Sha256};

/// The interop services emitted by this toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteropService {
    SystemContractCall,
    SystemContractGetCallFlags,
    SystemCryptoCheckSig,
    SystemCryptoCheckMultisig,
    SystemRuntimeCheckWitness,
    SystemRuntimeNotify,
    SystemRuntimeLog,
    SystemRuntimeGetTrigger,
    SystemStorageGetContext,
    SystemStorageGet,
    SystemStoragePut,
    SystemStorageDelete,
}

impl InteropService {
    /// The service name as registered in the NeoVM interop table.
    pub fn name(self) -> &'static str {
        match self {
            Self::SystemContractCall => "System.Contract.Call",
            Self::SystemContractGetCallFlags => "System.Contract.GetCallFlags",
            Self::SystemCryptoCheckSig => "System.Crypto.CheckSig",
            Self::SystemCryptoCheckMultisig => "System.Crypto.CheckMultisig",
            Self::SystemRuntimeCheckWitness => "System.Runtime.CheckWitness",
            Self::SystemRuntimeNotify => "System.Runtime.Notify",
            Self::SystemRuntimeLog => "System.Runtime.Log",
            Self::SystemRuntimeGetTrigger => "System.Runtime.GetTrigger",
            Self::SystemStorageGetContext => "System.Storage.GetContext",
            Self::SystemStorageGet => "System.Storage.Get",
            Self::SystemStoragePut => "System.Storage.Put",
            Self::SystemStorageDelete => "System.Storage.Delete",
        }
    }

    /// The 4-byte syscall operand for this service.
    pub fn hash(self) -> [u8; 4] {
        let digest = Sha256::digest(self.name().as_bytes());
        let mut out = [0u8; 4];
        out.copy_from_slice(&digest[..4]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_syscall_hashes() {
        assert_eq!(
            hex::encode(InteropService::SystemCryptoCheckSig.hash()),
            "56e7b327"
        );
        assert_eq!(
            hex::encode(InteropService::SystemCryptoCheckMultisig.hash()),
            "9ed0dc3a"
        );
        assert_eq!(
            hex::encode(InteropService::SystemContractCall.hash()),
            "627d5b52"
        );
        assert_eq!(
            hex::encode(InteropService::SystemRuntimeNotify.hash()),
            "95016f61"
        );
    }
}
