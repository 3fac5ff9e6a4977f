//! Witness rules: programmable refinements of a signer's scope.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use neo3_io::{var_size, BinaryWriter, IoError, IoResult, MemoryReader, Serializable};
use neo3_types::hash160::HASH160_SIZE;
use neo3_types::{ECPublicKey, Hash160, PUBLIC_KEY_SIZE};

/// Maximum nesting depth of a witness-condition tree.
pub const MAX_NESTING_DEPTH: usize = 2;

/// Maximum number of children of an `And`/`Or` node.
pub const MAX_SUBITEMS: usize = 16;

/// Whether a matching condition allows or denies the witness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WitnessAction {
    /// Deny the witness if the condition is met.
    Deny = 0,
    /// Allow the witness if the condition is met.
    Allow = 1,
}

impl WitnessAction {
    pub fn byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Deny),
            1 => Some(Self::Allow),
            _ => None,
        }
    }

    fn json_name(self) -> &'static str {
        match self {
            Self::Deny => "Deny",
            Self::Allow => "Allow",
        }
    }
}

/// A rule scoping a signature to contexts matched by its condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessRule {
    pub action: WitnessAction,
    pub condition: WitnessCondition,
}

impl WitnessRule {
    pub fn new(action: WitnessAction, condition: WitnessCondition) -> Self {
        Self { action, condition }
    }
}

/// A condition in a witness rule.
///
/// Conditions form a tree of maximum depth [`MAX_NESTING_DEPTH`]; each
/// composite node holds at most [`MAX_SUBITEMS`] children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WitnessCondition {
    /// A constant outcome.
    Boolean(bool),
    /// Negates the inner condition.
    Not(Box<WitnessCondition>),
    /// All children must hold.
    And(Vec<WitnessCondition>),
    /// At least one child must hold.
    Or(Vec<WitnessCondition>),
    /// The executing script has the given hash.
    ScriptHash(Hash160),
    /// The executing contract belongs to the given group.
    Group(ECPublicKey),
    /// Execution was entered from the transaction script.
    CalledByEntry,
    /// The calling contract has the given hash.
    CalledByContract(Hash160),
    /// The calling contract belongs to the given group.
    CalledByGroup(ECPublicKey),
}

impl WitnessCondition {
    pub const BOOLEAN_TYPE: u8 = 0x00;
    pub const NOT_TYPE: u8 = 0x01;
    pub const AND_TYPE: u8 = 0x02;
    pub const OR_TYPE: u8 = 0x03;
    pub const SCRIPT_HASH_TYPE: u8 = 0x18;
    pub const GROUP_TYPE: u8 = 0x19;
    pub const CALLED_BY_ENTRY_TYPE: u8 = 0x20;
    pub const CALLED_BY_CONTRACT_TYPE: u8 = 0x28;
    pub const CALLED_BY_GROUP_TYPE: u8 = 0x29;

    /// The discriminant byte written before the payload.
    pub fn type_byte(&self) -> u8 {
        match self {
            Self::Boolean(_) => Self::BOOLEAN_TYPE,
            Self::Not(_) => Self::NOT_TYPE,
            Self::And(_) => Self::AND_TYPE,
            Self::Or(_) => Self::OR_TYPE,
            Self::ScriptHash(_) => Self::SCRIPT_HASH_TYPE,
            Self::Group(_) => Self::GROUP_TYPE,
            Self::CalledByEntry => Self::CALLED_BY_ENTRY_TYPE,
            Self::CalledByContract(_) => Self::CALLED_BY_CONTRACT_TYPE,
            Self::CalledByGroup(_) => Self::CALLED_BY_GROUP_TYPE,
        }
    }

    /// The JSON type name used by the RPC layer.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "Boolean",
            Self::Not(_) => "Not",
            Self::And(_) => "And",
            Self::Or(_) => "Or",
            Self::ScriptHash(_) => "ScriptHash",
            Self::Group(_) => "Group",
            Self::CalledByEntry => "CalledByEntry",
            Self::CalledByContract(_) => "CalledByContract",
            Self::CalledByGroup(_) => "CalledByGroup",
        }
    }

    /// Validates depth and fan-out limits over the whole tree.
    pub fn is_valid(&self, remaining_depth: usize) -> bool {
        match self {
            Self::Not(inner) => remaining_depth > 0 && inner.is_valid(remaining_depth - 1),
            Self::And(children) | Self::Or(children) => {
                remaining_depth > 0
                    && !children.is_empty()
                    && children.len() <= MAX_SUBITEMS
                    && children.iter().all(|c| c.is_valid(remaining_depth - 1))
            }
            _ => true,
        }
    }

    fn deserialize_at_depth(
        reader: &mut MemoryReader<'_>,
        remaining_depth: usize,
    ) -> IoResult<Self> {
        let type_offset = reader.position();
        let type_byte = reader.read_u8("witness condition type")?;
        match type_byte {
            Self::BOOLEAN_TYPE => Ok(Self::Boolean(reader.read_bool("boolean condition")?)),
            Self::NOT_TYPE => {
                if remaining_depth == 0 {
                    return Err(IoError::invalid_data(
                        "witness condition",
                        type_offset,
                        "maximum nesting depth exceeded",
                    ));
                }
                let inner = Self::deserialize_at_depth(reader, remaining_depth - 1)?;
                Ok(Self::Not(Box::new(inner)))
            }
            Self::AND_TYPE | Self::OR_TYPE => {
                if remaining_depth == 0 {
                    return Err(IoError::invalid_data(
                        "witness condition",
                        type_offset,
                        "maximum nesting depth exceeded",
                    ));
                }
                let count =
                    reader.read_var_int("witness condition children", MAX_SUBITEMS as u64)?;
                if count == 0 {
                    return Err(IoError::invalid_data(
                        "witness condition children",
                        type_offset,
                        "composite condition requires at least one child",
                    ));
                }
                let mut children = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    children.push(Self::deserialize_at_depth(reader, remaining_depth - 1)?);
                }
                if type_byte == Self::AND_TYPE {
                    Ok(Self::And(children))
                } else {
                    Ok(Self::Or(children))
                }
            }
            Self::SCRIPT_HASH_TYPE | Self::CALLED_BY_CONTRACT_TYPE => {
                let offset = reader.position();
                let bytes = reader.read_bytes("condition script hash", HASH160_SIZE)?;
                let hash = Hash160::from_bytes(&bytes).map_err(|e| {
                    IoError::invalid_data("condition script hash", offset, e.to_string())
                })?;
                if type_byte == Self::SCRIPT_HASH_TYPE {
                    Ok(Self::ScriptHash(hash))
                } else {
                    Ok(Self::CalledByContract(hash))
                }
            }
            Self::GROUP_TYPE | Self::CALLED_BY_GROUP_TYPE => {
                let offset = reader.position();
                let bytes = reader.read_bytes("condition group key", PUBLIC_KEY_SIZE)?;
                let key = ECPublicKey::from_bytes(&bytes).map_err(|e| {
                    IoError::invalid_data("condition group key", offset, e.to_string())
                })?;
                if type_byte == Self::GROUP_TYPE {
                    Ok(Self::Group(key))
                } else {
                    Ok(Self::CalledByGroup(key))
                }
            }
            Self::CALLED_BY_ENTRY_TYPE => Ok(Self::CalledByEntry),
            other => Err(IoError::unexpected_discriminant(
                "witness condition type",
                type_offset,
                other,
            )),
        }
    }
}

impl Serializable for WitnessCondition {
    fn size(&self) -> usize {
        1 + match self {
            Self::Boolean(_) => 1,
            Self::Not(inner) => inner.size(),
            Self::And(children) | Self::Or(children) => {
                var_size(children.len() as u64)
                    + children.iter().map(Serializable::size).sum::<usize>()
            }
            Self::ScriptHash(_) | Self::CalledByContract(_) => HASH160_SIZE,
            Self::Group(_) | Self::CalledByGroup(_) => PUBLIC_KEY_SIZE,
            Self::CalledByEntry => 0,
        }
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.type_byte());
        match self {
            Self::Boolean(value) => writer.write_bool(*value),
            Self::Not(inner) => Serializable::serialize(inner.as_ref(), writer),
            Self::And(children) | Self::Or(children) => {
                writer.write_var_int(children.len() as u64);
                for child in children {
                    Serializable::serialize(child, writer);
                }
            }
            Self::ScriptHash(hash) | Self::CalledByContract(hash) => {
                writer.write_bytes(hash.as_bytes())
            }
            Self::Group(key) | Self::CalledByGroup(key) => writer.write_bytes(key.as_bytes()),
            Self::CalledByEntry => {}
        }
    }

    fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self> {
        Self::deserialize_at_depth(reader, MAX_NESTING_DEPTH)
    }
}

impl Serialize for WitnessCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.type_name())?;
        match self {
            Self::Boolean(value) => map.serialize_entry("expression", value)?,
            Self::Not(inner) => map.serialize_entry("expression", inner)?,
            Self::And(children) | Self::Or(children) => {
                map.serialize_entry("expressions", children)?
            }
            Self::ScriptHash(hash) | Self::CalledByContract(hash) => {
                map.serialize_entry("hash", &hash.to_string())?
            }
            Self::Group(key) | Self::CalledByGroup(key) => {
                map.serialize_entry("group", &key.to_string())?
            }
            Self::CalledByEntry => {}
        }
        map.end()
    }
}

impl Serializable for WitnessRule {
    fn size(&self) -> usize {
        1 + self.condition.size()
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.action.byte());
        Serializable::serialize(&self.condition, writer);
    }

    fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self> {
        let offset = reader.position();
        let action_byte = reader.read_u8("witness rule action")?;
        let action = WitnessAction::from_byte(action_byte).ok_or_else(|| {
            IoError::unexpected_discriminant("witness rule action", offset, action_byte)
        })?;
        let condition = WitnessCondition::deserialize(reader)?;
        Ok(Self { action, condition })
    }
}

impl Serialize for WitnessRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("action", self.action.json_name())?;
        map.serialize_entry("condition", &self.condition)?;
        map.end()
    }
}
