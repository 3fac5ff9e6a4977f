//! A local account used for signing.

use neo3_script::{ScriptResult, VerificationScript};
use neo3_types::{ECKeyPair, ECPublicKey, Hash160, TypeResult};

/// A local account: a script hash plus whatever signing material is
/// available for it.
///
/// Accounts come in three shapes: key-backed (can sign), watch-only
/// (script hash only), and multi-sig (verification script known, signing
/// assembled externally).
#[derive(Debug, Clone)]
pub struct Account {
    script_hash: Hash160,
    key_pair: Option<ECKeyPair>,
    verification_script: Option<VerificationScript>,
}

impl Account {
    /// Creates a fresh account with a random key pair.
    pub fn create() -> TypeResult<Self> {
        Ok(Self::from_key_pair(ECKeyPair::generate()?))
    }

    /// Creates an account holding the given key pair.
    pub fn from_key_pair(key_pair: ECKeyPair) -> Self {
        let verification_script = VerificationScript::from_public_key(key_pair.public_key());
        Self {
            script_hash: verification_script.script_hash(),
            key_pair: Some(key_pair),
            verification_script: Some(verification_script),
        }
    }

    /// Creates a watch-only account for a public key.
    pub fn from_public_key(key: &ECPublicKey) -> Self {
        let verification_script = VerificationScript::from_public_key(key);
        Self {
            script_hash: verification_script.script_hash(),
            key_pair: None,
            verification_script: Some(verification_script),
        }
    }

    /// Creates a watch-only account from a bare script hash.
    pub fn from_script_hash(script_hash: Hash160) -> Self {
        Self {
            script_hash,
            key_pair: None,
            verification_script: None,
        }
    }

    /// Creates a watch-only account from an address.
    pub fn from_address(address: &str) -> TypeResult<Self> {
        Ok(Self::from_script_hash(Hash160::from_address(address)?))
    }

    /// Creates an account from an existing verification script.
    pub fn from_verification_script(script: VerificationScript) -> Self {
        Self {
            script_hash: script.script_hash(),
            key_pair: None,
            verification_script: Some(script),
        }
    }

    /// Creates an `m`-of-`n` multi-sig account from its member keys.
    pub fn multi_sig(keys: &[ECPublicKey], threshold: usize) -> ScriptResult<Self> {
        let script = VerificationScript::from_public_keys(keys, threshold)?;
        Ok(Self::from_verification_script(script))
    }

    /// The account identity.
    pub fn script_hash(&self) -> &Hash160 {
        &self.script_hash
    }

    /// The account's address.
    pub fn address(&self) -> String {
        self.script_hash.to_address()
    }

    /// The key pair, if this account can sign.
    pub fn key_pair(&self) -> Option<&ECKeyPair> {
        self.key_pair.as_ref()
    }

    /// The verification script, if known.
    pub fn verification_script(&self) -> Option<&VerificationScript> {
        self.verification_script.as_ref()
    }

    /// Whether this account is backed by a multi-sig script.
    pub fn is_multi_sig(&self) -> bool {
        self.verification_script
            .as_ref()
            .map(VerificationScript::is_multi_sig)
            .unwrap_or(false)
    }

    /// The signing threshold, when derivable from the script.
    pub fn signing_threshold(&self) -> Option<usize> {
        self.verification_script
            .as_ref()
            .and_then(|s| s.signing_threshold().ok())
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.script_hash == other.script_hash
    }
}

impl Eq for Account {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_backed_account_derives_identity() {
        let pair = ECKeyPair::from_private_key(
            &hex::decode("e6e919577dd7b8e97805151c05ae07ff4f752654d6d8797597aca989c02c4cb3")
                .unwrap(),
        )
        .unwrap();
        let expected = pair.script_hash();
        let account = Account::from_key_pair(pair);
        assert_eq!(account.script_hash(), &expected);
        assert!(account.key_pair().is_some());
        assert!(!account.is_multi_sig());
    }

    #[test]
    fn watch_only_account_has_no_key() {
        let account = Account::create().unwrap();
        let watch_only = Account::from_address(&account.address()).unwrap();
        assert_eq!(watch_only.script_hash(), account.script_hash());
        assert!(watch_only.key_pair().is_none());
        assert!(watch_only.verification_script().is_none());
    }

    #[test]
    fn multi_sig_account() {
        let a = ECKeyPair::generate().unwrap();
        let b = ECKeyPair::generate().unwrap();
        let account =
            Account::multi_sig(&[a.public_key().clone(), b.public_key().clone()], 2).unwrap();
        assert!(account.is_multi_sig());
        assert_eq!(account.signing_threshold(), Some(2));
    }
}
