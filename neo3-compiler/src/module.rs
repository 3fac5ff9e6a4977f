//! The NeoVM module: an arena of methods finalized into one script.

use std::collections::HashMap;

use neo3_script::OpCode;
use tracing::debug;

use crate::error::{CompilerError, CompilerResult};
use crate::instruction::FixupTarget;
use crate::jvm::JvmType;
use crate::method::{MethodId, NeoMethod};

/// An event declared by the contract.
#[derive(Debug, Clone, PartialEq)]
pub struct NeoEvent {
    /// The declaring static field's name.
    pub field_name: String,
    /// The name the event fires and appears in the manifest under.
    pub display_name: String,
    /// Parameter names and types.
    pub params: Vec<(String, JvmType)>,
}

/// A static field with an assigned slot.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticField {
    pub name: String,
    pub ty: JvmType,
}

/// The module under construction: methods are added during lowering and
/// resolved into a single byte script by [`finalize`](Self::finalize).
#[derive(Debug, Default)]
pub struct NeoModule {
    methods: Vec<NeoMethod>,
    ids_by_key: HashMap<String, MethodId>,
    pub events: Vec<NeoEvent>,
    pub static_fields: Vec<StaticField>,
}

impl NeoModule {
    pub fn new() -> Self {
        Self::default()
    }

    fn method_key(owner: &str, name: &str) -> String {
        format!("{owner}#{name}")
    }

    /// Creates and registers an empty method, returning its id.
    pub fn add_method(&mut self, owner: &str, name: &str) -> MethodId {
        let id = self.methods.len();
        self.methods.push(NeoMethod::new(id, name, owner));
        self.ids_by_key.insert(Self::method_key(owner, name), id);
        id
    }

    /// Looks up a method by owner and name.
    pub fn method_id(&self, owner: &str, name: &str) -> Option<MethodId> {
        self.ids_by_key.get(&Self::method_key(owner, name)).copied()
    }

    pub fn method(&self, id: MethodId) -> &NeoMethod {
        &self.methods[id]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut NeoMethod {
        &mut self.methods[id]
    }

    /// All methods in insertion order.
    pub fn methods(&self) -> &[NeoMethod] {
        &self.methods
    }

    /// The slot index of a static field, if registered.
    pub fn static_field_slot(&self, name: &str) -> Option<u8> {
        self.static_fields
            .iter()
            .position(|f| f.name == name)
            .map(|i| i as u8)
    }

    /// The event declared by a static field, if registered.
    pub fn event_by_field(&self, field_name: &str) -> Option<&NeoEvent> {
        self.events.iter().find(|e| e.field_name == field_name)
    }

    /// Resolves all addresses and produces the module script.
    ///
    /// Long jumps whose displacement fits an `i8` are shrunk to their
    /// short forms; shrinking only reduces distances, so repeating the
    /// address assignment converges.
    pub fn finalize(&mut self) -> CompilerResult<Vec<u8>> {
        for method in &mut self.methods {
            method.seal();
        }

        loop {
            self.assign_addresses();
            if !self.shrink_jumps()? {
                break;
            }
        }
        self.assign_addresses();
        self.resolve_targets()?;

        let mut script = Vec::new();
        for method in &self.methods {
            for insn in &method.instructions {
                insn.encode_into(&mut script);
            }
        }
        debug!(
            methods = self.methods.len(),
            bytes = script.len(),
            "finalized module"
        );
        Ok(script)
    }

    fn assign_addresses(&mut self) {
        let mut address = 0;
        for method in &mut self.methods {
            method.start_address = address;
            address += method.byte_size();
        }
    }

    // Returns true when at least one jump was shrunk this pass.
    fn shrink_jumps(&mut self) -> CompilerResult<bool> {
        let mut changed = false;
        for index in 0..self.methods.len() {
            let offsets = self.methods[index].instruction_offsets();
            let mut conversions = Vec::new();
            for (pos, insn) in self.methods[index].instructions.iter().enumerate() {
                let Some(FixupTarget::Label(label)) = &insn.target else {
                    continue;
                };
                let Some(short) = short_jump_form(insn.opcode) else {
                    continue;
                };
                let target_pos = self.methods[index].label_position(*label)?;
                let displacement = offsets[target_pos] as i64 - offsets[pos] as i64;
                // The displacement only shrinks further in later passes,
                // so this bound is safe.
                if i8::try_from(displacement).is_ok() {
                    conversions.push((pos, short));
                }
            }
            let method = &mut self.methods[index];
            for (pos, short) in conversions {
                let insn = &mut method.instructions[pos];
                insn.opcode = short;
                insn.operand = vec![0];
                changed = true;
            }
        }
        Ok(changed)
    }

    fn resolve_targets(&mut self) -> CompilerResult<()> {
        let starts: Vec<usize> = self.methods.iter().map(|m| m.start_address).collect();
        for method in &mut self.methods {
            let offsets = method.instruction_offsets();
            let label_addr = |labels: &NeoMethod, label| -> CompilerResult<i64> {
                Ok(offsets[labels.label_position(label)?] as i64)
            };

            // Collect first, then write, to keep the borrows disjoint.
            let mut patches: Vec<(usize, Vec<u8>)> = Vec::new();
            for (pos, insn) in method.instructions.iter().enumerate() {
                let Some(target) = &insn.target else { continue };
                let insn_addr = offsets[pos] as i64;
                let operand = match target {
                    FixupTarget::Method(id) => {
                        let absolute_insn = (method.start_address + offsets[pos]) as i64;
                        let displacement = starts[*id] as i64 - absolute_insn;
                        i32_operand(displacement, &method.name)?
                    }
                    FixupTarget::Label(label) => {
                        let displacement = label_addr(method, *label)? - insn_addr;
                        if insn.operand.len() == 1 {
                            let value = i8::try_from(displacement).map_err(|_| {
                                CompilerError::UnresolvedTarget {
                                    what: "short jump",
                                    method: method.name.clone(),
                                }
                            })?;
                            vec![value as u8]
                        } else {
                            i32_operand(displacement, &method.name)?
                        }
                    }
                    FixupTarget::Try { catch, finally } => {
                        let mut operand = Vec::with_capacity(8);
                        let catch_disp = match catch {
                            Some(label) => label_addr(method, *label)? - insn_addr,
                            None => 0,
                        };
                        let finally_disp = match finally {
                            Some(label) => label_addr(method, *label)? - insn_addr,
                            None => 0,
                        };
                        operand.extend_from_slice(&i32_operand(catch_disp, &method.name)?);
                        operand.extend_from_slice(&i32_operand(finally_disp, &method.name)?);
                        operand
                    }
                };
                patches.push((pos, operand));
            }
            for (pos, operand) in patches {
                method.instructions[pos].operand = operand;
            }
        }
        Ok(())
    }
}

fn i32_operand(displacement: i64, method: &str) -> CompilerResult<Vec<u8>> {
    let value = i32::try_from(displacement).map_err(|_| CompilerError::UnresolvedTarget {
        what: "jump displacement",
        method: method.to_string(),
    })?;
    Ok(value.to_le_bytes().to_vec())
}

fn short_jump_form(op: OpCode) -> Option<OpCode> {
    Some(match op {
        OpCode::JMP_L => OpCode::JMP,
        OpCode::JMPIF_L => OpCode::JMPIF,
        OpCode::JMPIFNOT_L => OpCode::JMPIFNOT,
        OpCode::JMPEQ_L => OpCode::JMPEQ,
        OpCode::JMPNE_L => OpCode::JMPNE,
        OpCode::JMPGT_L => OpCode::JMPGT,
        OpCode::JMPGE_L => OpCode::JMPGE,
        OpCode::JMPLT_L => OpCode::JMPLT,
        OpCode::JMPLE_L => OpCode::JMPLE,
        OpCode::ENDTRY_L => OpCode::ENDTRY,
        _ => return None,
    })
}
