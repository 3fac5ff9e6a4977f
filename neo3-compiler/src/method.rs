//! A method in the NeoVM module under construction.

use std::collections::HashMap;

use neo3_script::OpCode;

use crate::error::{CompilerError, CompilerResult};
use crate::instruction::NeoInstruction;
use crate::jvm::{JvmType, LabelId};
use crate::{MAX_LOCALS, MAX_PARAMS};

/// Stable identifier of a method in the module arena.
pub type MethodId = usize;

/// Maps a parameter or local between its JVM slot and its NeoVM slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeoVariable {
    pub neo_index: u8,
    pub jvm_index: u16,
}

/// A lowered method: linear instructions plus slot and label tables.
#[derive(Debug, Clone)]
pub struct NeoMethod {
    pub id: MethodId,
    /// The ABI name, e.g. `add` or `_initialize`.
    pub name: String,
    /// The fully qualified name of the defining class.
    pub owner: String,
    /// Whether the method appears in the contract ABI.
    pub is_abi_method: bool,
    /// Whether the ABI marks the method read-only.
    pub is_safe: bool,
    pub param_types: Vec<JvmType>,
    /// ABI parameter names, aligned with `param_types`.
    pub param_names: Vec<String>,
    pub return_type: JvmType,
    params: Vec<NeoVariable>,
    variables: Vec<NeoVariable>,
    pub instructions: Vec<NeoInstruction>,
    /// Label positions, as indices into `instructions`.
    labels: HashMap<LabelId, usize>,
    /// Byte address of the method in the finalized module script.
    pub start_address: usize,
}

impl NeoMethod {
    pub fn new(id: MethodId, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: owner.into(),
            is_abi_method: false,
            is_safe: false,
            param_types: Vec::new(),
            param_names: Vec::new(),
            return_type: JvmType::Void,
            params: Vec::new(),
            variables: Vec::new(),
            instructions: Vec::new(),
            labels: HashMap::new(),
            start_address: 0,
        }
    }

    /// Registers a parameter slot.
    pub fn add_parameter(&mut self, jvm_index: u16) -> CompilerResult<u8> {
        if self.params.len() >= MAX_PARAMS {
            return Err(CompilerError::TooMany {
                what: "parameter",
                actual: self.params.len() + 1,
                max: MAX_PARAMS,
            });
        }
        let neo_index = self.params.len() as u8;
        self.params.push(NeoVariable {
            neo_index,
            jvm_index,
        });
        Ok(neo_index)
    }

    /// Registers a local-variable slot.
    pub fn add_variable(&mut self, jvm_index: u16) -> CompilerResult<u8> {
        if self.variables.len() >= MAX_LOCALS {
            return Err(CompilerError::TooMany {
                what: "local variable",
                actual: self.variables.len() + 1,
                max: MAX_LOCALS,
            });
        }
        let neo_index = self.variables.len() as u8;
        self.variables.push(NeoVariable {
            neo_index,
            jvm_index,
        });
        Ok(neo_index)
    }

    /// The parameter mapped to a JVM slot, if any.
    pub fn parameter_by_jvm_index(&self, jvm_index: u16) -> Option<&NeoVariable> {
        self.params.iter().find(|v| v.jvm_index == jvm_index)
    }

    /// The local variable mapped to a JVM slot, if any.
    pub fn variable_by_jvm_index(&self, jvm_index: u16) -> Option<&NeoVariable> {
        self.variables.iter().find(|v| v.jvm_index == jvm_index)
    }

    /// Number of registered parameters.
    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    /// Number of registered local variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Appends an instruction.
    pub fn push(&mut self, instruction: NeoInstruction) {
        self.instructions.push(instruction);
    }

    /// Marks a label at the next instruction position.
    pub fn mark_label(&mut self, label: LabelId) {
        self.labels.insert(label, self.instructions.len());
    }

    /// The instruction index a label points at.
    pub fn label_position(&self, label: LabelId) -> CompilerResult<usize> {
        self.labels.get(&label).copied().ok_or_else(|| {
            CompilerError::UnresolvedTarget {
                what: "label",
                method: self.name.clone(),
            }
        })
    }

    /// Whether control can fall off the end of the instruction list.
    pub fn falls_through(&self) -> bool {
        !matches!(
            self.instructions.last().map(|i| i.opcode),
            Some(OpCode::RET) | Some(OpCode::THROW) | Some(OpCode::ABORT) | Some(OpCode::JMP)
                | Some(OpCode::JMP_L)
        )
    }

    /// Appends the trailing `RET` when the body can fall off the end.
    pub fn seal(&mut self) {
        if self.falls_through() {
            self.push(NeoInstruction::new(OpCode::RET));
        }
    }

    /// The method's byte size under current operand widths.
    pub fn byte_size(&self) -> usize {
        self.instructions.iter().map(NeoInstruction::byte_size).sum()
    }

    /// Byte offsets of each instruction relative to the method start,
    /// plus the total size as the final entry.
    pub fn instruction_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.instructions.len() + 1);
        let mut acc = 0;
        for insn in &self.instructions {
            offsets.push(acc);
            acc += insn.byte_size();
        }
        offsets.push(acc);
        offsets
    }
}
