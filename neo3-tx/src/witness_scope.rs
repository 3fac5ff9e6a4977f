//! Witness scopes: which contracts a signature may authorize.

use serde::{Serialize, Serializer};

/// A single witness-scope flag.
///
/// Scopes combine into a bitmask on the wire. `Global` is exclusive of
/// all other scopes; `None` marks a fee-only signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WitnessScope {
    /// Fee-only: the signature pays fees but authorizes nothing.
    None = 0x00,
    /// The signature is valid only in the entry script's context.
    CalledByEntry = 0x01,
    /// The signature is valid in the listed contracts.
    CustomContracts = 0x10,
    /// The signature is valid for contracts in the listed groups.
    CustomGroups = 0x20,
    /// Validity is decided by the attached witness rules.
    WitnessRules = 0x40,
    /// The signature is valid everywhere.
    Global = 0x80,
}

impl WitnessScope {
    /// The scope's bit in the combined mask.
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Looks up a single scope by its exact byte value.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::None),
            0x01 => Some(Self::CalledByEntry),
            0x10 => Some(Self::CustomContracts),
            0x20 => Some(Self::CustomGroups),
            0x40 => Some(Self::WitnessRules),
            0x80 => Some(Self::Global),
            _ => None,
        }
    }

    /// The JSON name used by the RPC layer.
    pub fn json_name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::CalledByEntry => "CalledByEntry",
            Self::CustomContracts => "CustomContracts",
            Self::CustomGroups => "CustomGroups",
            Self::WitnessRules => "WitnessRules",
            Self::Global => "Global",
        }
    }

    /// ORs a set of scopes into the wire byte.
    pub fn combine_scopes(scopes: &[WitnessScope]) -> u8 {
        scopes.iter().fold(0, |acc, scope| acc | scope.byte())
    }

    /// Splits a wire byte into its scope flags. A zero byte yields
    /// `[None]`.
    pub fn extract_combined_scopes(byte: u8) -> Vec<WitnessScope> {
        if byte == 0 {
            return vec![Self::None];
        }
        [
            Self::CalledByEntry,
            Self::CustomContracts,
            Self::CustomGroups,
            Self::WitnessRules,
            Self::Global,
        ]
        .into_iter()
        .filter(|scope| byte & scope.byte() != 0)
        .collect()
    }
}

impl Serialize for WitnessScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.json_name())
    }
}
