//! Linear NeoVM instructions with pending jump and call targets.

use neo3_script::OpCode;

use crate::jvm::LabelId;
use crate::method::MethodId;

/// A reference fixed up during module finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixupTarget {
    /// A call into another method of the module.
    Method(MethodId),
    /// A jump to a label in the same method.
    Label(LabelId),
    /// The catch and finally entries of a `TRY` instruction.
    Try {
        catch: Option<LabelId>,
        finally: Option<LabelId>,
    },
}

/// One NeoVM instruction as emitted by the lowering pass.
///
/// `operand` holds every byte following the opcode, length prefixes
/// included. Instructions with a pending [`FixupTarget`] carry a zeroed
/// operand of the final width so that address assignment sees correct
/// sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct NeoInstruction {
    pub opcode: OpCode,
    pub operand: Vec<u8>,
    pub target: Option<FixupTarget>,
}

impl NeoInstruction {
    /// An instruction without an operand.
    pub fn new(opcode: OpCode) -> Self {
        Self {
            opcode,
            operand: Vec::new(),
            target: None,
        }
    }

    /// An instruction with explicit operand bytes.
    pub fn with_operand(opcode: OpCode, operand: Vec<u8>) -> Self {
        Self {
            opcode,
            operand,
            target: None,
        }
    }

    /// A jump or call carrying a pending target; the operand is zeroed
    /// to the opcode's width.
    pub fn with_target(opcode: OpCode, target: FixupTarget) -> Self {
        let width = opcode
            .operand_size()
            .map(|info| info.prefix + info.size)
            .unwrap_or(0);
        Self {
            opcode,
            operand: vec![0; width],
            target: Some(target),
        }
    }

    /// The encoded size in bytes.
    pub fn byte_size(&self) -> usize {
        1 + self.operand.len()
    }

    /// Writes the instruction into `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.opcode.byte());
        out.extend_from_slice(&self.operand);
    }
}
