//! The contract manifest: ABI, permissions, groups, and standards.
//!
//! The manifest travels as JSON next to the NEF file; the field names
//! below follow the node's canonical casing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The manifest describing a deployed contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractManifest {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<ContractGroup>,
    #[serde(default)]
    pub features: serde_json::Map<String, Value>,
    #[serde(rename = "supportedstandards", default)]
    pub supported_standards: Vec<String>,
    pub abi: ContractAbi,
    #[serde(default)]
    pub permissions: Vec<ContractPermission>,
    /// Either a list of contract hashes / group keys, or `"*"`.
    #[serde(default)]
    pub trusts: Vec<String>,
    #[serde(default)]
    pub extra: Option<Value>,
}

/// A group the contract belongs to, proven by a signature over its hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractGroup {
    /// The group's public key, hex-encoded.
    pub pubkey: String,
    /// Base64 signature of the contract hash by the group key.
    pub signature: String,
}

/// The contract's ABI: callable methods and emitted events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractAbi {
    #[serde(default)]
    pub methods: Vec<ContractMethod>,
    #[serde(default)]
    pub events: Vec<ContractEvent>,
}

/// A single exported method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractMethod {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ContractParameterDef>,
    #[serde(rename = "returntype")]
    pub return_type: String,
    /// Byte offset of the method in the contract script.
    pub offset: u32,
    /// Whether the method is read-only.
    #[serde(default)]
    pub safe: bool,
}

/// A named, typed parameter in the ABI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
}

/// An event the contract can emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ContractParameterDef>,
}

/// A contract/method pair this contract is allowed to call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractPermission {
    /// A contract hash, a group public key, or `"*"`.
    pub contract: String,
    /// Allowed method names, or `["*"]`.
    pub methods: Vec<String>,
}

impl ContractPermission {
    /// The wildcard permission allowing any call.
    pub fn wildcard() -> Self {
        Self {
            contract: "*".to_string(),
            methods: vec!["*".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn manifest_json_field_names() {
        let manifest = ContractManifest {
            name: "Example".to_string(),
            supported_standards: vec!["NEP-17".to_string()],
            abi: ContractAbi {
                methods: vec![ContractMethod {
                    name: "symbol".to_string(),
                    parameters: vec![],
                    return_type: "String".to_string(),
                    offset: 0,
                    safe: true,
                }],
                events: vec![],
            },
            permissions: vec![ContractPermission::wildcard()],
            ..Default::default()
        };
        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["supportedstandards"], json!(["NEP-17"]));
        assert_eq!(value["abi"]["methods"][0]["returntype"], json!("String"));
        assert_eq!(value["permissions"][0]["contract"], json!("*"));
    }

    #[test]
    fn manifest_round_trips_through_json() {
        let manifest = ContractManifest {
            name: "Example".to_string(),
            abi: ContractAbi {
                methods: vec![],
                events: vec![ContractEvent {
                    name: "Transfer".to_string(),
                    parameters: vec![ContractParameterDef {
                        name: "amount".to_string(),
                        param_type: "Integer".to_string(),
                    }],
                }],
            },
            ..Default::default()
        };
        let text = serde_json::to_string(&manifest).unwrap();
        let parsed: ContractManifest = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, manifest);
    }
}
