//! Typed parameters for contract invocations.

use base64::Engine;
use num_bigint::BigInt;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::hash160::Hash160;
use crate::hash256::Hash256;
use crate::key_pair::ECPublicKey;

/// The parameter types known to the Neo ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractParameterType {
    Any,
    Boolean,
    Integer,
    ByteArray,
    String,
    Hash160,
    Hash256,
    PublicKey,
    Signature,
    Array,
    Map,
    InteropInterface,
    Void,
}

impl ContractParameterType {
    /// The JSON name used by the RPC layer and the contract manifest.
    pub fn json_name(&self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::ByteArray => "ByteArray",
            Self::String => "String",
            Self::Hash160 => "Hash160",
            Self::Hash256 => "Hash256",
            Self::PublicKey => "PublicKey",
            Self::Signature => "Signature",
            Self::Array => "Array",
            Self::Map => "Map",
            Self::InteropInterface => "InteropInterface",
            Self::Void => "Void",
        }
    }
}

impl Serialize for ContractParameterType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.json_name())
    }
}

/// A typed value passed to a contract invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractParameter {
    /// A parameter of any type with no value, e.g. an optional argument.
    Any,
    Boolean(bool),
    Integer(BigInt),
    ByteArray(Vec<u8>),
    String(String),
    Hash160(Hash160),
    Hash256(Hash256),
    PublicKey(ECPublicKey),
    Signature(Vec<u8>),
    Array(Vec<ContractParameter>),
    /// Key-value pairs; keys must not be `Array` or `Map` themselves.
    Map(Vec<(ContractParameter, ContractParameter)>),
}

impl ContractParameter {
    /// Convenience constructor for integer parameters.
    pub fn integer(value: impl Into<BigInt>) -> Self {
        Self::Integer(value.into())
    }

    /// Convenience constructor for string parameters.
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Convenience constructor for script-hash parameters.
    pub fn hash160(value: Hash160) -> Self {
        Self::Hash160(value)
    }

    /// The ABI type of this parameter.
    pub fn param_type(&self) -> ContractParameterType {
        match self {
            Self::Any => ContractParameterType::Any,
            Self::Boolean(_) => ContractParameterType::Boolean,
            Self::Integer(_) => ContractParameterType::Integer,
            Self::ByteArray(_) => ContractParameterType::ByteArray,
            Self::String(_) => ContractParameterType::String,
            Self::Hash160(_) => ContractParameterType::Hash160,
            Self::Hash256(_) => ContractParameterType::Hash256,
            Self::PublicKey(_) => ContractParameterType::PublicKey,
            Self::Signature(_) => ContractParameterType::Signature,
            Self::Array(_) => ContractParameterType::Array,
            Self::Map(_) => ContractParameterType::Map,
        }
    }
}

/// Serializes to the JSON-RPC shape `{"type": ..., "value": ...}`.
/// Byte arrays and signatures encode as Base64, integers as strings.
impl Serialize for ContractParameter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", self.param_type().json_name())?;
        match self {
            Self::Any => map.serialize_entry("value", &Option::<()>::None)?,
            Self::Boolean(b) => map.serialize_entry("value", b)?,
            Self::Integer(i) => map.serialize_entry("value", &i.to_string())?,
            Self::ByteArray(bytes) | Self::Signature(bytes) => map.serialize_entry(
                "value",
                &base64::engine::general_purpose::STANDARD.encode(bytes),
            )?,
            Self::String(s) => map.serialize_entry("value", s)?,
            Self::Hash160(h) => map.serialize_entry("value", &h.to_string())?,
            Self::Hash256(h) => map.serialize_entry("value", &h.to_string())?,
            Self::PublicKey(k) => map.serialize_entry("value", &k.to_string())?,
            Self::Array(items) => map.serialize_entry("value", items)?,
            Self::Map(entries) => {
                map.serialize_entry("value", &MapEntries(entries))?;
            }
        }
        map.end()
    }
}

struct MapEntries<'a>(&'a [(ContractParameter, ContractParameter)]);

impl Serialize for MapEntries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for (key, value) in self.0 {
            seq.serialize_element(&MapEntry { key, value })?;
        }
        seq.end()
    }
}

#[derive(Serialize)]
struct MapEntry<'a> {
    key: &'a ContractParameter,
    value: &'a ContractParameter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_serializes_as_string() {
        let param = ContractParameter::integer(5);
        assert_eq!(
            serde_json::to_value(&param).unwrap(),
            json!({"type": "Integer", "value": "5"})
        );
    }

    #[test]
    fn byte_array_serializes_as_base64() {
        let param = ContractParameter::ByteArray(vec![0x01, 0x02, 0x03]);
        assert_eq!(
            serde_json::to_value(&param).unwrap(),
            json!({"type": "ByteArray", "value": "AQID"})
        );
    }

    #[test]
    fn any_serializes_with_null_value() {
        assert_eq!(
            serde_json::to_value(ContractParameter::Any).unwrap(),
            json!({"type": "Any", "value": null})
        );
    }

    #[test]
    fn nested_array() {
        let param = ContractParameter::Array(vec![
            ContractParameter::Boolean(true),
            ContractParameter::string("neo"),
        ]);
        assert_eq!(
            serde_json::to_value(&param).unwrap(),
            json!({"type": "Array", "value": [
                {"type": "Boolean", "value": true},
                {"type": "String", "value": "neo"},
            ]})
        );
    }
}
