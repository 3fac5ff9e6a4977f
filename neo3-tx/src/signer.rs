//! Signers: who authorizes a transaction, and how far that reaches.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use neo3_io::{var_size_list, BinaryWriter, IoError, IoResult, MemoryReader, Serializable};
use neo3_types::hash160::HASH160_SIZE;
use neo3_types::{ContractParameter, ECPublicKey, Hash160, PUBLIC_KEY_SIZE};

use crate::account::Account;
use crate::error::{TransactionError, TransactionResult};
use crate::witness_rule::{WitnessRule, MAX_NESTING_DEPTH};
use crate::witness_scope::WitnessScope;
use crate::MAX_SIGNER_SUBITEMS;

/// The signing material behind a signer entry.
#[derive(Debug, Clone, PartialEq)]
pub enum SignerAuth {
    /// A local account; may hold a key pair for automatic signing.
    Account(Account),
    /// A contract whose witness is the given parameter pushes.
    Contract(Vec<ContractParameter>),
}

/// A transaction signer: an account hash, its witness scope, and the
/// scope's auxiliary data.
#[derive(Debug, Clone, PartialEq)]
pub struct Signer {
    account: Hash160,
    scopes: Vec<WitnessScope>,
    allowed_contracts: Vec<Hash160>,
    allowed_groups: Vec<ECPublicKey>,
    rules: Vec<WitnessRule>,
    auth: SignerAuth,
}

impl Signer {
    fn from_account(account: Account, scope: WitnessScope) -> Self {
        Self {
            account: *account.script_hash(),
            scopes: vec![scope],
            allowed_contracts: Vec::new(),
            allowed_groups: Vec::new(),
            rules: Vec::new(),
            auth: SignerAuth::Account(account),
        }
    }

    /// A fee-only account signer (scope `None`).
    pub fn none(account: Account) -> Self {
        Self::from_account(account, WitnessScope::None)
    }

    /// An account signer valid in the entry script (scope
    /// `CalledByEntry`).
    pub fn called_by_entry(account: Account) -> Self {
        Self::from_account(account, WitnessScope::CalledByEntry)
    }

    /// An account signer valid everywhere (scope `Global`).
    pub fn global(account: Account) -> Self {
        Self::from_account(account, WitnessScope::Global)
    }

    fn from_contract(hash: Hash160, params: Vec<ContractParameter>, scope: WitnessScope) -> Self {
        Self {
            account: hash,
            scopes: vec![scope],
            allowed_contracts: Vec::new(),
            allowed_groups: Vec::new(),
            rules: Vec::new(),
            auth: SignerAuth::Contract(params),
        }
    }

    /// A fee-only contract signer whose witness pushes `params`.
    pub fn contract_none(hash: Hash160, params: Vec<ContractParameter>) -> Self {
        Self::from_contract(hash, params, WitnessScope::None)
    }

    /// A contract signer with `CalledByEntry` scope.
    pub fn contract_called_by_entry(hash: Hash160, params: Vec<ContractParameter>) -> Self {
        Self::from_contract(hash, params, WitnessScope::CalledByEntry)
    }

    /// A contract signer with `Global` scope.
    pub fn contract_global(hash: Hash160, params: Vec<ContractParameter>) -> Self {
        Self::from_contract(hash, params, WitnessScope::Global)
    }

    /// The signer's account hash.
    pub fn script_hash(&self) -> &Hash160 {
        &self.account
    }

    /// The scope flags.
    pub fn scopes(&self) -> &[WitnessScope] {
        &self.scopes
    }

    /// The signing material.
    pub fn auth(&self) -> &SignerAuth {
        &self.auth
    }

    /// The allowed contracts of a `CustomContracts` scope.
    pub fn allowed_contracts(&self) -> &[Hash160] {
        &self.allowed_contracts
    }

    /// The allowed groups of a `CustomGroups` scope.
    pub fn allowed_groups(&self) -> &[ECPublicKey] {
        &self.allowed_groups
    }

    /// The rules of a `WitnessRules` scope.
    pub fn rules(&self) -> &[WitnessRule] {
        &self.rules
    }

    /// Whether this signer carries the fee-only `None` scope.
    pub fn is_fee_only(&self) -> bool {
        self.scopes.contains(&WitnessScope::None)
    }

    fn check_extendable(&self, addition: &str) -> TransactionResult<()> {
        if self.scopes.contains(&WitnessScope::Global) {
            return Err(TransactionError::config(format!(
                "trying to set {addition} on a signer with global scope"
            )));
        }
        Ok(())
    }

    /// Restricts the signature to the given contracts, adding the
    /// `CustomContracts` scope.
    pub fn set_allowed_contracts(&mut self, contracts: Vec<Hash160>) -> TransactionResult<&mut Self> {
        if contracts.is_empty() {
            return Ok(self);
        }
        self.check_extendable("allowed contracts")?;
        if self.allowed_contracts.len() + contracts.len() > MAX_SIGNER_SUBITEMS {
            return Err(TransactionError::config(format!(
                "a signer's scope can only contain {MAX_SIGNER_SUBITEMS} allowed contracts"
            )));
        }
        self.scopes.retain(|s| *s != WitnessScope::None);
        if !self.scopes.contains(&WitnessScope::CustomContracts) {
            self.scopes.push(WitnessScope::CustomContracts);
        }
        self.allowed_contracts.extend(contracts);
        Ok(self)
    }

    /// Restricts the signature to contracts of the given groups, adding
    /// the `CustomGroups` scope.
    pub fn set_allowed_groups(&mut self, groups: Vec<ECPublicKey>) -> TransactionResult<&mut Self> {
        if groups.is_empty() {
            return Ok(self);
        }
        self.check_extendable("allowed groups")?;
        if self.allowed_groups.len() + groups.len() > MAX_SIGNER_SUBITEMS {
            return Err(TransactionError::config(format!(
                "a signer's scope can only contain {MAX_SIGNER_SUBITEMS} allowed groups"
            )));
        }
        self.scopes.retain(|s| *s != WitnessScope::None);
        if !self.scopes.contains(&WitnessScope::CustomGroups) {
            self.scopes.push(WitnessScope::CustomGroups);
        }
        self.allowed_groups.extend(groups);
        Ok(self)
    }

    /// Attaches witness rules, adding the `WitnessRules` scope.
    pub fn set_rules(&mut self, rules: Vec<WitnessRule>) -> TransactionResult<&mut Self> {
        if rules.is_empty() {
            return Ok(self);
        }
        self.check_extendable("witness rules")?;
        if self.rules.len() + rules.len() > MAX_SIGNER_SUBITEMS {
            return Err(TransactionError::config(format!(
                "a signer's scope can only contain {MAX_SIGNER_SUBITEMS} rules"
            )));
        }
        for rule in &rules {
            if !rule.condition.is_valid(MAX_NESTING_DEPTH) {
                return Err(TransactionError::config(
                    "a witness rule condition exceeds the depth or fan-out limits",
                ));
            }
        }
        self.scopes.retain(|s| *s != WitnessScope::None);
        if !self.scopes.contains(&WitnessScope::WitnessRules) {
            self.scopes.push(WitnessScope::WitnessRules);
        }
        self.rules.extend(rules);
        Ok(self)
    }
}

impl Serializable for Signer {
    fn size(&self) -> usize {
        let mut size = HASH160_SIZE + 1;
        if self.scopes.contains(&WitnessScope::CustomContracts) {
            let wrapped: Vec<Hash160List> =
                self.allowed_contracts.iter().cloned().map(Hash160List).collect();
            size += var_size_list(&wrapped);
        }
        if self.scopes.contains(&WitnessScope::CustomGroups) {
            let wrapped: Vec<GroupList> =
                self.allowed_groups.iter().cloned().map(GroupList).collect();
            size += var_size_list(&wrapped);
        }
        if self.scopes.contains(&WitnessScope::WitnessRules) {
            size += var_size_list(&self.rules);
        }
        size
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(self.account.as_bytes());
        writer.write_u8(WitnessScope::combine_scopes(&self.scopes));
        if self.scopes.contains(&WitnessScope::CustomContracts) {
            let wrapped: Vec<Hash160List> =
                self.allowed_contracts.iter().cloned().map(Hash160List).collect();
            writer.write_serializable_list(&wrapped);
        }
        if self.scopes.contains(&WitnessScope::CustomGroups) {
            let wrapped: Vec<GroupList> =
                self.allowed_groups.iter().cloned().map(GroupList).collect();
            writer.write_serializable_list(&wrapped);
        }
        if self.scopes.contains(&WitnessScope::WitnessRules) {
            writer.write_serializable_list(&self.rules);
        }
    }

    fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self> {
        let offset = reader.position();
        let hash_bytes = reader.read_bytes("signer account", HASH160_SIZE)?;
        let account = Hash160::from_bytes(&hash_bytes)
            .map_err(|e| IoError::invalid_data("signer account", offset, e.to_string()))?;

        let scope_offset = reader.position();
        let scope_byte = reader.read_u8("signer scope")?;
        let scopes = WitnessScope::extract_combined_scopes(scope_byte);
        let known: u8 = [
            WitnessScope::CalledByEntry,
            WitnessScope::CustomContracts,
            WitnessScope::CustomGroups,
            WitnessScope::WitnessRules,
            WitnessScope::Global,
        ]
        .iter()
        .fold(0, |acc, s| acc | s.byte());
        if scope_byte & !known != 0 {
            return Err(IoError::unexpected_discriminant(
                "signer scope",
                scope_offset,
                scope_byte,
            ));
        }
        if scopes.contains(&WitnessScope::Global) && scope_byte != WitnessScope::Global.byte() {
            return Err(IoError::invalid_data(
                "signer scope",
                scope_offset,
                "the global scope cannot be combined with other scopes",
            ));
        }

        let allowed_contracts = if scopes.contains(&WitnessScope::CustomContracts) {
            Hash160List::deserialize_list(reader, "allowed contracts", MAX_SIGNER_SUBITEMS)?
                .into_iter()
                .map(|h| h.0)
                .collect()
        } else {
            Vec::new()
        };
        let allowed_groups = if scopes.contains(&WitnessScope::CustomGroups) {
            GroupList::deserialize_list(reader, "allowed groups", MAX_SIGNER_SUBITEMS)?
                .into_iter()
                .map(|g| g.0)
                .collect()
        } else {
            Vec::new()
        };
        let rules = if scopes.contains(&WitnessScope::WitnessRules) {
            WitnessRule::deserialize_list(reader, "witness rules", MAX_SIGNER_SUBITEMS)?
        } else {
            Vec::new()
        };

        Ok(Self {
            account,
            scopes,
            allowed_contracts,
            allowed_groups,
            rules,
            auth: SignerAuth::Account(Account::from_script_hash(account)),
        })
    }
}

// Wire wrappers for the plain list element types.
struct Hash160List(Hash160);

impl Serializable for Hash160List {
    fn size(&self) -> usize {
        HASH160_SIZE
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(self.0.as_bytes());
    }

    fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self> {
        let offset = reader.position();
        let bytes = reader.read_bytes("hash", HASH160_SIZE)?;
        let hash = Hash160::from_bytes(&bytes)
            .map_err(|e| IoError::invalid_data("hash", offset, e.to_string()))?;
        Ok(Self(hash))
    }
}

struct GroupList(ECPublicKey);

impl Serializable for GroupList {
    fn size(&self) -> usize {
        PUBLIC_KEY_SIZE
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(self.0.as_bytes());
    }

    fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self> {
        let offset = reader.position();
        let bytes = reader.read_bytes("group key", PUBLIC_KEY_SIZE)?;
        let key = ECPublicKey::from_bytes(&bytes)
            .map_err(|e| IoError::invalid_data("group key", offset, e.to_string()))?;
        Ok(Self(key))
    }
}

/// The JSON shape sent to `invokescript` and friends.
impl Serialize for Signer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("account", &self.account.to_string())?;
        let scopes = self
            .scopes
            .iter()
            .map(|s| s.json_name())
            .collect::<Vec<_>>()
            .join(",");
        map.serialize_entry("scopes", &scopes)?;
        if !self.allowed_contracts.is_empty() {
            let contracts: Vec<String> =
                self.allowed_contracts.iter().map(Hash160::to_string).collect();
            map.serialize_entry("allowedcontracts", &contracts)?;
        }
        if !self.allowed_groups.is_empty() {
            let groups: Vec<String> =
                self.allowed_groups.iter().map(ECPublicKey::to_string).collect();
            map.serialize_entry("allowedgroups", &groups)?;
        }
        if !self.rules.is_empty() {
            map.serialize_entry("rules", &self.rules)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::witness_rule::{WitnessAction, WitnessCondition};
    use std::str::FromStr;

    fn account_hash() -> Hash160 {
        Hash160::from_str("0x969a77db482f74ce27105f760efa139223431394").unwrap()
    }

    fn contract_hash() -> Hash160 {
        Hash160::from_str("0xef4073a0f2b305a38ec4050e4d3d28bc40ea63f5").unwrap()
    }

    #[test]
    fn wire_form_of_called_by_entry_signer() {
        let signer = Signer::called_by_entry(Account::from_script_hash(account_hash()));
        let bytes = signer.to_array();
        assert_eq!(bytes.len(), 21);
        assert_eq!(&bytes[..20], account_hash().as_bytes());
        assert_eq!(bytes[20], 0x01);
    }

    #[test]
    fn custom_contracts_round_trip() {
        let mut signer = Signer::called_by_entry(Account::from_script_hash(account_hash()));
        signer.set_allowed_contracts(vec![contract_hash()]).unwrap();
        assert_eq!(
            WitnessScope::combine_scopes(signer.scopes()),
            0x11
        );

        let bytes = signer.to_array();
        assert_eq!(bytes.len(), signer.size());
        let parsed = Signer::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.script_hash(), signer.script_hash());
        assert_eq!(parsed.allowed_contracts(), signer.allowed_contracts());
        assert_eq!(
            WitnessScope::combine_scopes(parsed.scopes()),
            WitnessScope::combine_scopes(signer.scopes())
        );
    }

    #[test]
    fn global_scope_cannot_take_contracts() {
        let mut signer = Signer::global(Account::from_script_hash(account_hash()));
        assert!(signer.set_allowed_contracts(vec![contract_hash()]).is_err());
    }

    #[test]
    fn none_scope_is_replaced_by_custom_scopes() {
        let mut signer = Signer::none(Account::from_script_hash(account_hash()));
        signer.set_allowed_contracts(vec![contract_hash()]).unwrap();
        assert!(!signer.is_fee_only());
        assert_eq!(signer.scopes(), &[WitnessScope::CustomContracts]);
    }

    #[test]
    fn subitem_limit_is_enforced() {
        let mut signer = Signer::called_by_entry(Account::from_script_hash(account_hash()));
        let contracts = vec![contract_hash(); MAX_SIGNER_SUBITEMS + 1];
        assert!(signer.set_allowed_contracts(contracts).is_err());
    }

    #[test]
    fn rules_round_trip() {
        let mut signer = Signer::none(Account::from_script_hash(account_hash()));
        signer
            .set_rules(vec![WitnessRule::new(
                WitnessAction::Allow,
                WitnessCondition::CalledByContract(contract_hash()),
            )])
            .unwrap();
        let bytes = signer.to_array();
        let parsed = Signer::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.rules(), signer.rules());
    }

    #[test]
    fn combined_global_scope_is_rejected_on_read() {
        let mut bytes = account_hash().as_bytes().to_vec();
        bytes.push(0x81); // Global | CalledByEntry
        assert!(Signer::from_bytes(&bytes).is_err());
    }

    #[test]
    fn json_shape() {
        let signer = Signer::called_by_entry(Account::from_script_hash(account_hash()));
        let value = serde_json::to_value(&signer).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "account": "0x969a77db482f74ce27105f760efa139223431394",
                "scopes": "CalledByEntry",
            })
        );
    }
}
