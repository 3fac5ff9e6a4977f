//! The compilation entry point.

use tracing::{debug, info};

use neo3_contract::{ContractManifest, NefFile};
use neo3_script::OpCode;

use crate::error::{CompilerError, CompilerResult};
use crate::instruction::NeoInstruction;
use crate::jvm::{ClassRegistry, JvmClass, JvmField, JvmInsn, JvmMethod, JvmType};
use crate::lowering::{lower_method, LoweringCtx};
use crate::manifest::build_manifest;
use crate::module::{NeoEvent, StaticField};
use crate::pragma::{PragmaEffect, Pragmas};
use crate::{COMPILER_NAME, MAX_STATIC_FIELDS};

/// The name of the synthetic static-initializer method.
pub const INITSSLOT_METHOD_NAME: &str = "_initialize";

/// The output of a compilation: the executable and its manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationResult {
    pub nef: NefFile,
    pub manifest: ContractManifest,
}

/// Compiles a contract class and its transitively referenced user
/// classes into NeoVM bytecode.
pub struct Compiler<'a> {
    registry: &'a ClassRegistry,
    pragmas: &'a Pragmas,
}

impl<'a> Compiler<'a> {
    pub fn new(registry: &'a ClassRegistry, pragmas: &'a Pragmas) -> Self {
        Self { registry, pragmas }
    }

    /// Compiles the named contract class.
    pub fn compile(&self, contract_class: &str) -> CompilerResult<CompilationResult> {
        let class = self.registry.get(contract_class)?.clone();
        let mut ctx = LoweringCtx::new(self.registry, self.pragmas, class.name.clone());

        collect_events(&mut ctx, &class)?;
        check_instance_ctor(&class)?;
        collect_static_fields(&mut ctx, &class)?;
        self.collect_and_lower_methods(&mut ctx, &class)?;
        self.drain_worklist(&mut ctx)?;

        let script = ctx.module.finalize()?;
        let nef = NefFile::new(COMPILER_NAME, Vec::new(), script)
            .map_err(|e| CompilerError::Nef(e.to_string()))?;
        let manifest = build_manifest(&ctx.module, self.pragmas, &class);
        info!(
            contract = %class.name,
            methods = ctx.module.methods().len(),
            script_bytes = nef.script().len(),
            "compiled contract"
        );
        Ok(CompilationResult { nef, manifest })
    }

    fn collect_and_lower_methods(
        &self,
        ctx: &mut LoweringCtx<'_>,
        class: &JvmClass,
    ) -> CompilerResult<()> {
        // Register every method first so that calls between contract
        // methods resolve to their final ids, then lower the bodies.
        let mut registered = Vec::new();
        for jvm_method in &class.methods {
            if jvm_method.is_ctor() || jvm_method.is_class_ctor() {
                continue;
            }
            if !jvm_method.is_static {
                return Err(CompilerError::unsupported(format!(
                    "method '{}' of class {} is non-static but only static methods are allowed \
                     in smart contracts",
                    jvm_method.name, class.name
                )));
            }
            let id = ctx.module.add_method(&class.name, &jvm_method.name);
            let effects = ctx
                .pragmas
                .method_effects(&class.name, &jvm_method.name)
                .to_vec();
            let method = ctx.module.method_mut(id);
            method.is_abi_method = jvm_method.is_public;
            method.is_safe = effects.iter().any(|e| matches!(e, PragmaEffect::Safe));
            if effects
                .iter()
                .any(|e| matches!(e, PragmaEffect::OnVerification))
            {
                method.name = "verify".to_string();
            }
            registered.push((id, jvm_method));
        }
        for (id, jvm_method) in registered {
            debug!(method = %jvm_method.name, "lowering contract method");
            lower_method(ctx, id, class, jvm_method, false)?;
        }
        Ok(())
    }

    // Lowers methods discovered while lowering others (constructors and
    // static methods of referenced classes).
    fn drain_worklist(&self, ctx: &mut LoweringCtx<'_>) -> CompilerResult<()> {
        while let Some((id, class_name, method_name)) = ctx.worklist.pop() {
            let class = self.registry.get(&class_name)?.clone();
            let jvm_method = class
                .method(&method_name)
                .ok_or_else(|| CompilerError::UnknownMethod {
                    class: class_name.clone(),
                    method: method_name.clone(),
                })?
                .clone();
            debug!(class = %class_name, method = %method_name, "lowering referenced method");
            lower_method(ctx, id, &class, &jvm_method, jvm_method.is_ctor())?;
        }
        Ok(())
    }
}

fn is_event_field(pragmas: &Pragmas, field: &JvmField) -> bool {
    matches!(&field.ty, JvmType::Object(type_name) if pragmas.is_event_type(type_name))
}

fn collect_events(ctx: &mut LoweringCtx<'_>, class: &JvmClass) -> CompilerResult<()> {
    for field in &class.fields {
        if !is_event_field(ctx.pragmas, field) {
            continue;
        }
        if !field.is_static {
            return Err(CompilerError::unsupported(format!(
                "event field '{}' must be static",
                field.name
            )));
        }
        let JvmType::Object(type_name) = &field.ty else {
            unreachable!()
        };
        let display_name = ctx
            .pragmas
            .event_display_name(&class.name, &field.name)
            .unwrap_or(&field.name)
            .to_string();
        // The event type's `send` method describes the parameters.
        let params = match ctx.registry.get(type_name).ok().and_then(|c| c.method("send")) {
            Some(send) => send
                .params
                .iter()
                .enumerate()
                .map(|(i, ty)| {
                    let name = send
                        .local_vars
                        .get(i + 1) // slot 0 is `this`
                        .map(|v| v.name.clone())
                        .unwrap_or_else(|| format!("arg{i}"));
                    (name, ty.clone())
                })
                .collect(),
            None => Vec::new(),
        };
        ctx.module.events.push(NeoEvent {
            field_name: field.name.clone(),
            display_name,
            params,
        });
    }
    Ok(())
}

// Rejects contract classes with an explicit instance constructor doing
// real work; compiler-generated empty constructors are tolerated.
fn check_instance_ctor(class: &JvmClass) -> CompilerResult<()> {
    let Some(ctor) = class.method(JvmMethod::CTOR_NAME) else {
        return Ok(());
    };
    let mut past_super_call = false;
    for insn in &ctor.instructions {
        match insn {
            JvmInsn::Label(_) | JvmInsn::Line(_) => {}
            JvmInsn::Load(0) if !past_super_call => {}
            JvmInsn::InvokeSpecial(mref)
                if !past_super_call && mref.name == JvmMethod::CTOR_NAME =>
            {
                past_super_call = true;
            }
            JvmInsn::Return => {}
            _ => {
                return Err(CompilerError::unsupported(format!(
                    "class {} has an explicit instance constructor or static constructor, but \
                     neither is supported",
                    class.name
                )));
            }
        }
    }
    Ok(())
}

fn collect_static_fields(ctx: &mut LoweringCtx<'_>, class: &JvmClass) -> CompilerResult<()> {
    if class.fields.iter().any(|f| !f.is_static) {
        return Err(CompilerError::unsupported(format!(
            "class {} has non-static fields but only static fields are supported in smart \
             contracts",
            class.name
        )));
    }
    let static_fields: Vec<&JvmField> = class
        .fields
        .iter()
        .filter(|f| !is_event_field(ctx.pragmas, f))
        .collect();
    if static_fields.is_empty() {
        return Ok(());
    }
    if static_fields.len() > MAX_STATIC_FIELDS {
        return Err(CompilerError::TooMany {
            what: "static field",
            actual: static_fields.len(),
            max: MAX_STATIC_FIELDS,
        });
    }
    for field in &static_fields {
        ctx.module.static_fields.push(StaticField {
            name: field.name.clone(),
            ty: field.ty.clone(),
        });
    }

    let id = ctx.module.add_method(&class.name, INITSSLOT_METHOD_NAME);
    {
        let method = ctx.module.method_mut(id);
        method.is_abi_method = true;
        method.push(NeoInstruction::with_operand(
            OpCode::INITSSLOT,
            vec![static_fields.len() as u8],
        ));
    }
    if let Some(class_ctor) = class.method(JvmMethod::CLASS_CTOR_NAME) {
        lower_method(ctx, id, class, class_ctor, false)?;
    }
    // Without a class initializer the method stays empty; finalization
    // appends its RET.
    Ok(())
}
