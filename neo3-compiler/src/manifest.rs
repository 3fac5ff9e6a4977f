//! Builds the contract manifest from a finalized module.

use neo3_contract::{
    ContractAbi, ContractEvent, ContractGroup, ContractManifest, ContractMethod,
    ContractParameterDef, ContractPermission,
};

use crate::jvm::{JvmClass, JvmType};
use crate::module::NeoModule;
use crate::pragma::Pragmas;

/// Projects a JVM type onto its Neo ABI type name.
pub fn abi_type(ty: &JvmType) -> &'static str {
    match ty {
        JvmType::Void => "Void",
        JvmType::Boolean => "Boolean",
        JvmType::Byte | JvmType::Char | JvmType::Short | JvmType::Int | JvmType::Long => "Integer",
        JvmType::Float | JvmType::Double => "Any",
        JvmType::Array(inner) if matches!(**inner, JvmType::Byte) => "ByteArray",
        JvmType::Array(_) => "Array",
        JvmType::Object(name) => match name.rsplit('.').next().unwrap_or(name) {
            "String" => "String",
            "ByteString" => "ByteArray",
            "BigInteger" | "Integer" => "Integer",
            "Boolean" => "Boolean",
            "Hash160" => "Hash160",
            "Hash256" => "Hash256",
            "ECPoint" | "PublicKey" => "PublicKey",
            "Map" => "Map",
            "List" => "Array",
            "Object" => "Any",
            _ => "Any",
        },
    }
}

/// Aggregates the module's ABI, events, and the contract class's
/// manifest pragma into the manifest document.
pub fn build_manifest(
    module: &NeoModule,
    pragmas: &Pragmas,
    contract_class: &JvmClass,
) -> ContractManifest {
    let config = pragmas.manifest(&contract_class.name).cloned().unwrap_or_default();

    let methods = module
        .methods()
        .iter()
        .filter(|m| m.is_abi_method)
        .map(|m| ContractMethod {
            name: m.name.clone(),
            parameters: m
                .param_names
                .iter()
                .zip(&m.param_types)
                .map(|(name, ty)| ContractParameterDef {
                    name: name.clone(),
                    param_type: abi_type(ty).to_string(),
                })
                .collect(),
            return_type: abi_type(&m.return_type).to_string(),
            offset: m.start_address as u32,
            safe: m.is_safe,
        })
        .collect();

    let events = module
        .events
        .iter()
        .map(|event| ContractEvent {
            name: event.display_name.clone(),
            parameters: event
                .params
                .iter()
                .map(|(name, ty)| ContractParameterDef {
                    name: name.clone(),
                    param_type: abi_type(ty).to_string(),
                })
                .collect(),
        })
        .collect();

    let permissions = if config.permissions.is_empty() {
        vec![ContractPermission::wildcard()]
    } else {
        config
            .permissions
            .iter()
            .map(|(contract, methods)| ContractPermission {
                contract: contract.clone(),
                methods: methods.clone(),
            })
            .collect()
    };

    ContractManifest {
        name: config
            .name
            .unwrap_or_else(|| contract_class.simple_name().to_string()),
        groups: config
            .groups
            .iter()
            .map(|(pubkey, signature)| ContractGroup {
                pubkey: pubkey.clone(),
                signature: signature.clone(),
            })
            .collect(),
        features: Default::default(),
        supported_standards: config.supported_standards.clone(),
        abi: ContractAbi { methods, events },
        permissions,
        trusts: config.trusts.clone(),
        extra: None,
    }
}
