//! Lowers JVM method bodies to NeoVM instructions.

use neo3_script::{InteropService, OpCode, ScriptBuilder, StackItemType};

use crate::error::{CompilerError, CompilerResult};
use crate::instruction::{FixupTarget, NeoInstruction};
use crate::jvm::{
    ClassRegistry, Cmp, JvmClass, JvmFieldRef, JvmInsn, JvmMethod, JvmMethodRef, JvmType, LabelId,
};
use crate::method::MethodId;
use crate::module::NeoModule;
use crate::pragma::{PragmaEffect, Pragmas};

const STRING_BUILDER: &str = "java.lang.StringBuilder";
const OBJECT: &str = "java.lang.Object";
const THROWABLE: &str = "java.lang.Throwable";
const EXCEPTION: &str = "java.lang.Exception";
const ASSERTION_ERROR: &str = "java.lang.AssertionError";

/// Shared state of one compilation run.
pub(crate) struct LoweringCtx<'a> {
    pub registry: &'a ClassRegistry,
    pub pragmas: &'a Pragmas,
    pub contract_class: String,
    pub module: NeoModule,
    /// Methods created during lowering that still need their bodies
    /// compiled: `(id, class, method, skip_ctor_prefix)`.
    pub worklist: Vec<(MethodId, String, String)>,
    synthetic_labels: LabelId,
}

impl<'a> LoweringCtx<'a> {
    pub fn new(registry: &'a ClassRegistry, pragmas: &'a Pragmas, contract_class: String) -> Self {
        Self {
            registry,
            pragmas,
            contract_class,
            module: NeoModule::new(),
            worklist: Vec::new(),
            synthetic_labels: 0,
        }
    }

    fn fresh_label(&mut self) -> LabelId {
        self.synthetic_labels += 1;
        LabelId::MAX - self.synthetic_labels
    }

    /// Returns the module method for `owner#name`, creating and queueing
    /// it for body compilation when first referenced.
    fn require_method(&mut self, owner: &str, name: &str) -> MethodId {
        if let Some(id) = self.module.method_id(owner, name) {
            return id;
        }
        let id = self.module.add_method(owner, name);
        self.worklist
            .push((id, owner.to_string(), name.to_string()));
        id
    }
}

// What a NEW allocation is waiting for.
enum PendingNew {
    StringBuilder { appended: bool },
    Throwable { assertion: bool },
    Object { class: String },
}

/// Lowers one method body into the module method `id`.
///
/// `skip_ctor_prefix` skips everything up to and including the call to
/// the superclass constructor; used when compiling `<init>` bodies.
pub(crate) fn lower_method(
    ctx: &mut LoweringCtx<'_>,
    id: MethodId,
    class: &JvmClass,
    jvm: &JvmMethod,
    skip_ctor_prefix: bool,
) -> CompilerResult<()> {
    for var in &jvm.local_vars {
        if var.ty.is_floating_point() {
            return Err(CompilerError::unsupported(format!(
                "method '{}' has unsupported floating-point parameter or variable types",
                jvm.name
            )));
        }
    }

    register_slots(ctx, id, jvm)?;
    {
        let method = ctx.module.method_mut(id);
        method.param_types = jvm.params.clone();
        method.param_names = (0..jvm.params.len())
            .map(|i| {
                jvm.local_vars
                    .get(if jvm.is_static { i } else { i + 1 })
                    .map(|v| v.name.clone())
                    .unwrap_or_else(|| format!("arg{i}"))
            })
            .collect();
        method.return_type = jvm.ret.clone();
        let locals = method.variable_count();
        let params = method.parameter_count();
        if locals + params > 0 {
            method.push(NeoInstruction::with_operand(
                OpCode::INITSLOT,
                vec![locals as u8, params as u8],
            ));
        }
    }

    let mut instructions = jvm.instructions.as_slice();
    if skip_ctor_prefix {
        let super_call = instructions.iter().position(|insn| {
            matches!(insn, JvmInsn::InvokeSpecial(mref) if mref.name == JvmMethod::CTOR_NAME)
        });
        match super_call {
            Some(pos) => {
                let JvmInsn::InvokeSpecial(mref) = &instructions[pos] else {
                    unreachable!()
                };
                if mref.owner == OBJECT {
                    // The Object constructor is a no-op; drop it together
                    // with the `this` load feeding it.
                    instructions = &instructions[pos + 1..];
                } else if class.super_name.as_deref() == Some(mref.owner.as_str())
                    && ctx.pragmas.is_struct(&mref.owner)
                {
                    // A struct super constructor lowers as a regular call
                    // further down; keep the prefix.
                } else {
                    return Err(CompilerError::unsupported(format!(
                        "found a call to the super constructor of {} but inheritance is not \
                         supported",
                        mref.owner
                    )));
                }
            }
            None => {
                return Err(CompilerError::unsupported(format!(
                    "expected a call to the super constructor in '{}.{}'",
                    class.name, jvm.name
                )))
            }
        }
    }

    lower_body(ctx, id, jvm, instructions)
}

fn register_slots(ctx: &mut LoweringCtx<'_>, id: MethodId, jvm: &JvmMethod) -> CompilerResult<()> {
    let method = ctx.module.method_mut(id);
    // `this` occupies slot 0 of constructors.
    let mut param_count = jvm.params.len();
    if !jvm.is_static {
        param_count += 1;
    }

    if jvm.local_vars.len() >= param_count {
        for var in &jvm.local_vars[..param_count] {
            method.add_parameter(var.index)?;
        }
        for var in &jvm.local_vars[param_count..] {
            method.add_variable(var.index)?;
        }
    } else {
        // No variable table; derive the parameter slots from the
        // descriptor. Wide types occupy two JVM slots.
        let mut jvm_index = 0u16;
        if !jvm.is_static {
            method.add_parameter(0)?;
            jvm_index = 1;
        }
        for ty in &jvm.params {
            method.add_parameter(jvm_index)?;
            jvm_index += if ty.is_wide() { 2 } else { 1 };
        }
    }
    Ok(())
}

fn lower_body(
    ctx: &mut LoweringCtx<'_>,
    id: MethodId,
    jvm: &JvmMethod,
    instructions: &[JvmInsn],
) -> CompilerResult<()> {
    let mut pending_news: Vec<PendingNew> = Vec::new();
    let mut skip_dups = 0usize;
    let mut pending_event: Option<String> = None;

    for insn in instructions {
        match insn {
            JvmInsn::Label(label) => {
                ctx.module.method_mut(id).mark_label(*label);
                lower_try_boundaries(ctx, id, jvm, *label)?;
            }
            JvmInsn::Line(_) => {}

            JvmInsn::Push(value) => push_number(ctx.module.method_mut(id), *value)?,
            JvmInsn::PushString(text) => {
                push_data(ctx.module.method_mut(id), text.as_bytes())?
            }
            JvmInsn::PushNull => ctx
                .module
                .method_mut(id)
                .push(NeoInstruction::new(OpCode::PUSHNULL)),

            JvmInsn::Load(index) => {
                load_or_store(ctx.module.method_mut(id), *index, true, &jvm.name)?
            }
            JvmInsn::Store(index) => {
                load_or_store(ctx.module.method_mut(id), *index, false, &jvm.name)?
            }
            JvmInsn::Inc(index, amount) => {
                load_or_store(ctx.module.method_mut(id), *index, true, &jvm.name)?;
                push_number(ctx.module.method_mut(id), *amount as i64)?;
                ctx.module.method_mut(id).push(NeoInstruction::new(OpCode::ADD));
                load_or_store(ctx.module.method_mut(id), *index, false, &jvm.name)?;
            }

            JvmInsn::Add => push_op(ctx, id, OpCode::ADD),
            JvmInsn::Sub => push_op(ctx, id, OpCode::SUB),
            JvmInsn::Mul => push_op(ctx, id, OpCode::MUL),
            JvmInsn::Div => push_op(ctx, id, OpCode::DIV),
            JvmInsn::Rem => push_op(ctx, id, OpCode::MOD),
            JvmInsn::Neg => push_op(ctx, id, OpCode::NEGATE),
            JvmInsn::Shl => push_op(ctx, id, OpCode::SHL),
            JvmInsn::Shr => push_op(ctx, id, OpCode::SHR),
            JvmInsn::And => push_op(ctx, id, OpCode::AND),
            JvmInsn::Or => push_op(ctx, id, OpCode::OR),
            JvmInsn::Xor => push_op(ctx, id, OpCode::XOR),

            JvmInsn::Goto(label) => ctx.module.method_mut(id).push(
                NeoInstruction::with_target(OpCode::JMP_L, FixupTarget::Label(*label)),
            ),
            JvmInsn::IfCmp(cmp, label) => {
                let method = ctx.module.method_mut(id);
                method.push(NeoInstruction::new(comparison_op(*cmp)));
                method.push(NeoInstruction::with_target(
                    OpCode::JMPIF_L,
                    FixupTarget::Label(*label),
                ));
            }
            JvmInsn::IfZero(cmp, label) => {
                let method = ctx.module.method_mut(id);
                match cmp {
                    // Zero tests map straight onto the boolean jumps.
                    Cmp::Eq => method.push(NeoInstruction::with_target(
                        OpCode::JMPIFNOT_L,
                        FixupTarget::Label(*label),
                    )),
                    Cmp::Ne => method.push(NeoInstruction::with_target(
                        OpCode::JMPIF_L,
                        FixupTarget::Label(*label),
                    )),
                    other => {
                        method.push(NeoInstruction::new(OpCode::PUSH0));
                        method.push(NeoInstruction::new(comparison_op(*other)));
                        method.push(NeoInstruction::with_target(
                            OpCode::JMPIF_L,
                            FixupTarget::Label(*label),
                        ));
                    }
                }
            }
            JvmInsn::IfRefCmp(equal, label) => {
                let method = ctx.module.method_mut(id);
                method.push(NeoInstruction::new(if *equal {
                    OpCode::EQUAL
                } else {
                    OpCode::NOTEQUAL
                }));
                method.push(NeoInstruction::with_target(
                    OpCode::JMPIF_L,
                    FixupTarget::Label(*label),
                ));
            }
            JvmInsn::IfNull(when_null, label) => {
                let method = ctx.module.method_mut(id);
                method.push(NeoInstruction::new(OpCode::ISNULL));
                let jump = if *when_null {
                    OpCode::JMPIF_L
                } else {
                    OpCode::JMPIFNOT_L
                };
                method.push(NeoInstruction::with_target(jump, FixupTarget::Label(*label)));
            }
            JvmInsn::Switch { cases, default } => {
                lower_switch(ctx, id, cases, *default)?;
            }

            JvmInsn::NewArray(element) => {
                let tag = map_stack_item_type(element);
                ctx.module.method_mut(id).push(NeoInstruction::with_operand(
                    OpCode::NEWARRAY_T,
                    vec![tag.byte()],
                ));
            }
            JvmInsn::ArrayLoad => push_op(ctx, id, OpCode::PICKITEM),
            JvmInsn::ArrayStore => push_op(ctx, id, OpCode::SETITEM),
            JvmInsn::ArrayLength => push_op(ctx, id, OpCode::SIZE),

            JvmInsn::InvokeStatic(mref) => lower_invoke_static(ctx, id, mref)?,
            JvmInsn::InvokeSpecial(mref) => {
                lower_invoke_special(ctx, id, mref, &mut pending_news)?
            }
            JvmInsn::InvokeVirtual(mref) => lower_invoke_virtual(
                ctx,
                id,
                mref,
                &mut pending_news,
                &mut pending_event,
                &jvm.name,
            )?,

            JvmInsn::GetStatic(field) => {
                lower_get_static(ctx, id, field, &mut pending_event)?
            }
            JvmInsn::PutStatic(field) => lower_put_static(ctx, id, field)?,
            JvmInsn::GetField(field) => {
                let index = instance_field_index(ctx, field)?;
                push_number(ctx.module.method_mut(id), index as i64)?;
                push_op(ctx, id, OpCode::PICKITEM);
            }
            JvmInsn::PutField(field) => {
                let index = instance_field_index(ctx, field)?;
                push_number(ctx.module.method_mut(id), index as i64)?;
                push_op(ctx, id, OpCode::SWAP);
                push_op(ctx, id, OpCode::SETITEM);
            }

            JvmInsn::New(class_name) => {
                lower_new(ctx, id, class_name, &mut pending_news, &mut skip_dups)?
            }
            JvmInsn::Dup => {
                if skip_dups > 0 {
                    skip_dups -= 1;
                } else {
                    push_op(ctx, id, OpCode::DUP);
                }
            }
            JvmInsn::Pop => push_op(ctx, id, OpCode::DROP),
            JvmInsn::Swap => push_op(ctx, id, OpCode::SWAP),

            JvmInsn::Return | JvmInsn::ReturnValue => push_op(ctx, id, OpCode::RET),
            JvmInsn::Throw => push_op(ctx, id, OpCode::THROW),

            JvmInsn::CheckCast(_) => {}
            JvmInsn::InstanceOf(ty) => {
                let mut tag = map_stack_item_type(ty);
                if tag == StackItemType::Boolean {
                    // Booleans usually travel as 0/1 integers.
                    tag = StackItemType::Integer;
                }
                if tag == StackItemType::Any {
                    return Err(CompilerError::unsupported(format!(
                        "the type '{ty:?}' is not supported for the instanceof operation"
                    )));
                }
                ctx.module.method_mut(id).push(NeoInstruction::with_operand(
                    OpCode::ISTYPE,
                    vec![tag.byte()],
                ));
            }
        }
    }

    Ok(())
}

// Emits TRY at region starts and ENDTRY at region ends keyed to `label`.
fn lower_try_boundaries(
    ctx: &mut LoweringCtx<'_>,
    id: MethodId,
    jvm: &JvmMethod,
    label: LabelId,
) -> CompilerResult<()> {
    let starts: Vec<LabelId> = jvm
        .try_catch
        .iter()
        .filter(|t| t.start == label)
        .map(|t| t.handler)
        .collect();
    for handler in starts {
        ctx.module.method_mut(id).push(NeoInstruction::with_target(
            OpCode::TRY_L,
            FixupTarget::Try {
                catch: Some(handler),
                finally: None,
            },
        ));
    }
    let ends = jvm.try_catch.iter().filter(|t| t.end == label).count();
    for _ in 0..ends {
        let exit = ctx.fresh_label();
        ctx.module.method_mut(id).push(NeoInstruction::with_target(
            OpCode::ENDTRY_L,
            FixupTarget::Label(exit),
        ));
        ctx.module.method_mut(id).mark_label(exit);
    }
    Ok(())
}

fn push_op(ctx: &mut LoweringCtx<'_>, id: MethodId, op: OpCode) {
    ctx.module.method_mut(id).push(NeoInstruction::new(op));
}

fn comparison_op(cmp: Cmp) -> OpCode {
    match cmp {
        Cmp::Eq => OpCode::NUMEQUAL,
        Cmp::Ne => OpCode::NUMNOTEQUAL,
        Cmp::Lt => OpCode::LT,
        Cmp::Ge => OpCode::GE,
        Cmp::Gt => OpCode::GT,
        Cmp::Le => OpCode::LE,
    }
}

/// Converts script-builder output into a single instruction.
fn insn_from_script(bytes: Vec<u8>) -> CompilerResult<NeoInstruction> {
    let opcode = OpCode::from_byte(bytes[0]).ok_or_else(|| {
        CompilerError::unsupported(format!("script builder emitted unknown opcode {:#04x}", bytes[0]))
    })?;
    Ok(NeoInstruction::with_operand(opcode, bytes[1..].to_vec()))
}

pub(crate) fn push_number(
    method: &mut crate::method::NeoMethod,
    value: i64,
) -> CompilerResult<()> {
    let mut builder = ScriptBuilder::new();
    builder.push_int(value);
    method.push(insn_from_script(builder.into_bytes())?);
    Ok(())
}

pub(crate) fn push_data(
    method: &mut crate::method::NeoMethod,
    data: &[u8],
) -> CompilerResult<()> {
    let mut builder = ScriptBuilder::new();
    builder.push_data(data);
    method.push(insn_from_script(builder.into_bytes())?);
    Ok(())
}

fn compact_slot_insn(index: u8, operand_form: OpCode) -> CompilerResult<NeoInstruction> {
    if index <= 6 {
        let byte = operand_form.byte() - 7 + index;
        let opcode = OpCode::from_byte(byte).ok_or_else(|| {
            CompilerError::unsupported(format!("no compact slot opcode for {byte:#04x}"))
        })?;
        Ok(NeoInstruction::new(opcode))
    } else {
        Ok(NeoInstruction::with_operand(operand_form, vec![index]))
    }
}

fn load_or_store(
    method: &mut crate::method::NeoMethod,
    jvm_index: u16,
    is_load: bool,
    method_name: &str,
) -> CompilerResult<()> {
    let insn = if let Some(param) = method.parameter_by_jvm_index(jvm_index) {
        let op = if is_load { OpCode::LDARG } else { OpCode::STARG };
        compact_slot_insn(param.neo_index, op)?
    } else if let Some(var) = method.variable_by_jvm_index(jvm_index) {
        let op = if is_load { OpCode::LDLOC } else { OpCode::STLOC };
        compact_slot_insn(var.neo_index, op)?
    } else {
        return Err(CompilerError::unsupported(format!(
            "JVM slot {jvm_index} of method '{method_name}' is not in the variable table"
        )));
    };
    method.push(insn);
    Ok(())
}

// SWAP / REVERSE3 / REVERSE4 / REVERSEN depending on the arity.
fn reverse_arguments(method: &mut crate::method::NeoMethod, count: usize) -> CompilerResult<()> {
    match count {
        0 | 1 => {}
        2 => method.push(NeoInstruction::new(OpCode::SWAP)),
        3 => method.push(NeoInstruction::new(OpCode::REVERSE3)),
        4 => method.push(NeoInstruction::new(OpCode::REVERSE4)),
        n => {
            push_number(method, n as i64)?;
            method.push(NeoInstruction::new(OpCode::REVERSEN));
        }
    }
    Ok(())
}

fn lower_invoke_static(
    ctx: &mut LoweringCtx<'_>,
    id: MethodId,
    mref: &JvmMethodRef,
) -> CompilerResult<()> {
    let effects = ctx.pragmas.method_effects(&mref.owner, &mref.name).to_vec();
    for effect in &effects {
        match effect {
            PragmaEffect::Syscall(services) => {
                reverse_arguments(ctx.module.method_mut(id), mref.params.len())?;
                for service in services {
                    ctx.module.method_mut(id).push(NeoInstruction::with_operand(
                        OpCode::SYSCALL,
                        service.hash().to_vec(),
                    ));
                }
                return Ok(());
            }
            PragmaEffect::Opcodes(opcodes) => {
                reverse_arguments(ctx.module.method_mut(id), mref.params.len())?;
                for (opcode, operand) in opcodes {
                    let expected = opcode
                        .operand_size()
                        .map(|info| info.prefix + info.size)
                        .unwrap_or(0);
                    // Data pushes carry their own length prefix, so only
                    // fixed-width operands are checked strictly.
                    let prefixed = opcode.operand_size().map(|i| i.prefix > 0).unwrap_or(false);
                    if !prefixed && operand.len() != expected {
                        return Err(CompilerError::OperandSizeMismatch {
                            opcode: format!("{opcode:?}"),
                            expected,
                            actual: operand.len(),
                        });
                    }
                    ctx.module
                        .method_mut(id)
                        .push(NeoInstruction::with_operand(*opcode, operand.clone()));
                }
                return Ok(());
            }
            _ => {}
        }
    }

    if let Some(hash) = ctx.pragmas.contract_hash(&mref.owner).copied() {
        let method = ctx.module.method_mut(id);
        push_number(method, mref.params.len() as i64)?;
        method.push(NeoInstruction::new(OpCode::PACK));
        push_data(method, mref.name.as_bytes())?;
        push_data(method, hash.as_bytes())?;
        method.push(NeoInstruction::with_operand(
            OpCode::SYSCALL,
            InteropService::SystemContractCall.hash().to_vec(),
        ));
        if mref.ret == JvmType::Void {
            method.push(NeoInstruction::new(OpCode::DROP));
        }
        return Ok(());
    }

    // A plain user method: make sure it exists in the module and call it.
    let callee = ctx.require_method(&mref.owner, &mref.name);
    reverse_arguments(ctx.module.method_mut(id), mref.params.len())?;
    ctx.module.method_mut(id).push(NeoInstruction::with_target(
        OpCode::CALL_L,
        FixupTarget::Method(callee),
    ));
    Ok(())
}

fn lower_invoke_special(
    ctx: &mut LoweringCtx<'_>,
    id: MethodId,
    mref: &JvmMethodRef,
    pending_news: &mut Vec<PendingNew>,
) -> CompilerResult<()> {
    if mref.name != JvmMethod::CTOR_NAME {
        return Err(CompilerError::UnsupportedInstruction {
            instruction: format!("INVOKESPECIAL {}#{}", mref.owner, mref.name),
            method: ctx.module.method(id).name.clone(),
        });
    }
    if mref.owner == STRING_BUILDER {
        // The StringBuilder constructor itself emits nothing.
        return Ok(());
    }
    match pending_news.pop() {
        Some(PendingNew::StringBuilder { .. }) => Err(CompilerError::unsupported(
            "unexpected constructor call while concatenating strings",
        )),
        Some(PendingNew::Throwable { assertion }) => {
            if mref.params.len() > 1 {
                return Err(CompilerError::unsupported(format!(
                    "an exception thrown in a contract can either take no arguments or a string \
                     argument, but {} were provided",
                    mref.params.len()
                )));
            }
            if mref.params.is_empty() {
                let message = if assertion { "assertion failed" } else { "error" };
                push_data(ctx.module.method_mut(id), message.as_bytes())?;
            } else if !assertion && mref.params[0] != JvmType::string() {
                return Err(CompilerError::unsupported(
                    "an exception thrown in a contract can either take no arguments or a string \
                     argument, but a non-string argument was provided",
                ));
            }
            Ok(())
        }
        Some(PendingNew::Object { class }) => {
            if class != mref.owner {
                return Err(CompilerError::unsupported(format!(
                    "constructor call to {} while allocating {class}",
                    mref.owner
                )));
            }
            let ctor = ctx.require_method(&mref.owner, JvmMethod::CTOR_NAME);
            // `this` (the DUPed array) counts as an argument.
            reverse_arguments(ctx.module.method_mut(id), mref.params.len() + 1)?;
            ctx.module.method_mut(id).push(NeoInstruction::with_target(
                OpCode::CALL_L,
                FixupTarget::Method(ctor),
            ));
            Ok(())
        }
        None => {
            if mref.owner == OBJECT {
                // A stray Object constructor call; nothing to do.
                Ok(())
            } else if ctx.pragmas.is_struct(&mref.owner) {
                // A struct super constructor invoked from a subclass
                // constructor body; `this` counts as an argument.
                let ctor = ctx.require_method(&mref.owner, JvmMethod::CTOR_NAME);
                reverse_arguments(ctx.module.method_mut(id), mref.params.len() + 1)?;
                ctx.module.method_mut(id).push(NeoInstruction::with_target(
                    OpCode::CALL_L,
                    FixupTarget::Method(ctor),
                ));
                Ok(())
            } else {
                Err(CompilerError::unsupported(format!(
                    "unexpected constructor call to {}",
                    mref.owner
                )))
            }
        }
    }
}

fn lower_invoke_virtual(
    ctx: &mut LoweringCtx<'_>,
    id: MethodId,
    mref: &JvmMethodRef,
    pending_news: &mut Vec<PendingNew>,
    pending_event: &mut Option<String>,
    method_name: &str,
) -> CompilerResult<()> {
    if mref.owner == STRING_BUILDER {
        let Some(position) = pending_news
            .iter()
            .rposition(|p| matches!(p, PendingNew::StringBuilder { .. }))
        else {
            return Err(CompilerError::unsupported(
                "StringBuilder call without a preceding allocation",
            ));
        };
        match mref.name.as_str() {
            "append" => {
                if let PendingNew::StringBuilder { appended } = &mut pending_news[position] {
                    if *appended {
                        push_op(ctx, id, OpCode::CAT);
                    }
                    *appended = true;
                }
                Ok(())
            }
            "toString" => {
                ctx.module.method_mut(id).push(NeoInstruction::with_operand(
                    OpCode::CONVERT,
                    vec![StackItemType::ByteString.byte()],
                ));
                pending_news.remove(position);
                Ok(())
            }
            other => Err(CompilerError::unsupported(format!(
                "only 'append()' and 'toString()' are supported for StringBuilder, but '{other}' \
                 was called"
            ))),
        }
    } else if ctx.pragmas.is_event_type(&mref.owner) {
        let display_name = pending_event.take().ok_or_else(|| {
            CompilerError::unsupported(format!(
                "call to an event send without loading an event field in '{method_name}'"
            ))
        })?;
        let param_count = mref.params.len();
        let method = ctx.module.method_mut(id);
        reverse_arguments(method, param_count)?;
        push_number(method, param_count as i64)?;
        method.push(NeoInstruction::new(OpCode::PACK));
        push_data(method, display_name.as_bytes())?;
        method.push(NeoInstruction::with_operand(
            OpCode::SYSCALL,
            InteropService::SystemRuntimeNotify.hash().to_vec(),
        ));
        Ok(())
    } else {
        Err(CompilerError::UnsupportedInstruction {
            instruction: format!("INVOKEVIRTUAL {}#{}", mref.owner, mref.name),
            method: method_name.to_string(),
        })
    }
}

fn lower_get_static(
    ctx: &mut LoweringCtx<'_>,
    id: MethodId,
    field: &JvmFieldRef,
    pending_event: &mut Option<String>,
) -> CompilerResult<()> {
    if let JvmType::Object(type_name) = &field.ty {
        if ctx.pragmas.is_event_type(type_name) {
            let event = ctx.module.event_by_field(&field.name).ok_or_else(|| {
                CompilerError::unsupported(format!(
                    "couldn't find the triggered event '{}'; events must be declared in the \
                     contract class",
                    field.name
                ))
            })?;
            *pending_event = Some(event.display_name.clone());
            return Ok(());
        }
    }
    if field.owner != ctx.contract_class {
        return Err(CompilerError::unsupported(format!(
            "only static fields of the contract class are supported, found {}.{}",
            field.owner, field.name
        )));
    }
    let slot = ctx.module.static_field_slot(&field.name).ok_or_else(|| {
        CompilerError::unsupported(format!("unknown static field '{}'", field.name))
    })?;
    let insn = compact_slot_insn(slot, OpCode::LDSFLD)?;
    ctx.module.method_mut(id).push(insn);
    Ok(())
}

fn lower_put_static(
    ctx: &mut LoweringCtx<'_>,
    id: MethodId,
    field: &JvmFieldRef,
) -> CompilerResult<()> {
    if let JvmType::Object(type_name) = &field.ty {
        if ctx.pragmas.is_event_type(type_name) {
            return Err(CompilerError::unsupported(format!(
                "event field '{}' cannot be reassigned",
                field.name
            )));
        }
    }
    if field.owner != ctx.contract_class {
        return Err(CompilerError::unsupported(format!(
            "only static fields of the contract class are supported, found {}.{}",
            field.owner, field.name
        )));
    }
    let slot = ctx.module.static_field_slot(&field.name).ok_or_else(|| {
        CompilerError::unsupported(format!("unknown static field '{}'", field.name))
    })?;
    let insn = compact_slot_insn(slot, OpCode::STSFLD)?;
    ctx.module.method_mut(id).push(insn);
    Ok(())
}

fn lower_switch(
    ctx: &mut LoweringCtx<'_>,
    id: MethodId,
    cases: &[(i64, LabelId)],
    default: LabelId,
) -> CompilerResult<()> {
    // DUP / PUSH k / NUMEQUAL / JMPIF per case, each jumping through a
    // trampoline that drops the duplicated selector.
    let mut trampolines = Vec::with_capacity(cases.len());
    for (value, target) in cases {
        let trampoline = ctx.fresh_label();
        trampolines.push((trampoline, *target));
        let method = ctx.module.method_mut(id);
        method.push(NeoInstruction::new(OpCode::DUP));
        push_number(method, *value)?;
        method.push(NeoInstruction::new(OpCode::NUMEQUAL));
        method.push(NeoInstruction::with_target(
            OpCode::JMPIF_L,
            FixupTarget::Label(trampoline),
        ));
    }
    let method = ctx.module.method_mut(id);
    method.push(NeoInstruction::new(OpCode::DROP));
    method.push(NeoInstruction::with_target(
        OpCode::JMP_L,
        FixupTarget::Label(default),
    ));
    for (trampoline, target) in trampolines {
        let method = ctx.module.method_mut(id);
        method.mark_label(trampoline);
        method.push(NeoInstruction::new(OpCode::DROP));
        method.push(NeoInstruction::with_target(
            OpCode::JMP_L,
            FixupTarget::Label(target),
        ));
    }
    Ok(())
}

fn lower_new(
    ctx: &mut LoweringCtx<'_>,
    id: MethodId,
    class_name: &str,
    pending_news: &mut Vec<PendingNew>,
    skip_dups: &mut usize,
) -> CompilerResult<()> {
    if class_name == STRING_BUILDER {
        pending_news.push(PendingNew::StringBuilder { appended: false });
        *skip_dups += 1;
        return Ok(());
    }
    if let Some(kind) = throwable_kind(ctx, class_name)? {
        pending_news.push(PendingNew::Throwable { assertion: kind });
        *skip_dups += 1;
        return Ok(());
    }

    let field_count = if ctx.pragmas.is_struct(class_name) {
        struct_field_count(ctx, class_name)?
    } else {
        let class = ctx.registry.get(class_name)?;
        if let Some(super_name) = &class.super_name {
            if super_name != OBJECT {
                return Err(CompilerError::unsupported(format!(
                    "class {class_name} inherits from {super_name} but inheritance is not \
                     supported"
                )));
            }
        }
        class.fields.iter().filter(|f| !f.is_static).count()
    };

    let method = ctx.module.method_mut(id);
    push_number(method, field_count as i64)?;
    method.push(NeoInstruction::new(OpCode::NEWARRAY));
    method.push(NeoInstruction::new(OpCode::DUP));
    // The JVM's own DUP after NEW is replaced by the one above.
    *skip_dups += 1;
    pending_news.push(PendingNew::Object {
        class: class_name.to_string(),
    });
    Ok(())
}

// Some(true) for assertion errors, Some(false) for exceptions.
fn throwable_kind(ctx: &LoweringCtx<'_>, class_name: &str) -> CompilerResult<Option<bool>> {
    match class_name {
        EXCEPTION => return Ok(Some(false)),
        ASSERTION_ERROR => return Ok(Some(true)),
        THROWABLE => {
            return Err(CompilerError::unsupported(format!(
                "contract uses exception type {THROWABLE} but only {EXCEPTION} and \
                 {ASSERTION_ERROR} are allowed"
            )))
        }
        _ => {}
    }
    // A user class reaching Throwable through its super chain is also a
    // throwable, but only the two standard types may be instantiated.
    let mut current = class_name.to_string();
    while let Ok(class) = ctx.registry.get(&current) {
        match &class.super_name {
            Some(super_name)
                if super_name == THROWABLE
                    || super_name == EXCEPTION
                    || super_name == ASSERTION_ERROR =>
            {
                return Err(CompilerError::unsupported(format!(
                    "contract uses exception of type {class_name} but only {EXCEPTION} and \
                     {ASSERTION_ERROR} are allowed"
                )));
            }
            Some(super_name) => current = super_name.clone(),
            None => break,
        }
    }
    Ok(None)
}

// The instance field count of a struct including all struct ancestors.
fn struct_field_count(ctx: &LoweringCtx<'_>, class_name: &str) -> CompilerResult<usize> {
    let mut count = 0;
    let mut current = class_name.to_string();
    loop {
        let class = ctx.registry.get(&current)?;
        count += class.fields.iter().filter(|f| !f.is_static).count();
        match &class.super_name {
            Some(super_name) if super_name == OBJECT => break,
            Some(super_name) => {
                if !ctx.pragmas.is_struct(super_name) {
                    return Err(CompilerError::unsupported(format!(
                        "struct classes are not allowed to inherit non-struct classes; {super_name} \
                         was inherited by {class_name}"
                    )));
                }
                current = super_name.clone();
            }
            None => break,
        }
    }
    Ok(count)
}

// The slot of an instance field: ancestors' fields first, then the
// declaring class's own, in declaration order.
fn instance_field_index(ctx: &LoweringCtx<'_>, field: &JvmFieldRef) -> CompilerResult<usize> {
    // Walk ancestors bottom-up, then count from the root down.
    let mut chain = Vec::new();
    let mut current = field.owner.clone();
    loop {
        let class = ctx.registry.get(&current)?;
        chain.push(class);
        match &class.super_name {
            Some(super_name) if super_name != OBJECT && ctx.registry.contains(super_name) => {
                current = super_name.clone();
            }
            _ => break,
        }
    }
    let mut index = 0;
    for class in chain.iter().rev() {
        for declared in class.fields.iter().filter(|f| !f.is_static) {
            if class.name == field.owner && declared.name == field.name {
                return Ok(index);
            }
            index += 1;
        }
    }
    Err(CompilerError::unsupported(format!(
        "unknown instance field {}.{}",
        field.owner, field.name
    )))
}

/// Projects a JVM type onto the NeoVM stack item type used by `ISTYPE`
/// and `NEWARRAY_T`.
pub(crate) fn map_stack_item_type(ty: &JvmType) -> StackItemType {
    match ty {
        JvmType::Boolean => StackItemType::Boolean,
        JvmType::Byte | JvmType::Char | JvmType::Short | JvmType::Int | JvmType::Long => {
            StackItemType::Integer
        }
        JvmType::Object(name) if name == "java.lang.String" => StackItemType::ByteString,
        JvmType::Array(inner) if matches!(**inner, JvmType::Byte) => StackItemType::Buffer,
        JvmType::Array(_) => StackItemType::Array,
        JvmType::Object(name) => match name.rsplit('.').next().unwrap_or(name) {
            "String" | "ByteString" => StackItemType::ByteString,
            "Map" => StackItemType::Map,
            "Boolean" => StackItemType::Boolean,
            "Integer" | "BigInteger" => StackItemType::Integer,
            "List" => StackItemType::Array,
            _ => StackItemType::Any,
        },
        _ => StackItemType::Any,
    }
}
